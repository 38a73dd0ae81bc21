use std::path::Path;
use structopt::StructOpt;
use trapsim::base::{ModelInput, DEFAULT_OUT_DIR};
use trapsim::fem::Simulation;
use trapsim::StrError;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "trapsim",
    about = "Runs a hydrogen transport simulation and writes the derived quantities as CSV"
)]
struct Options {
    /// JSON file with the model
    model: String,

    /// Directory receiving the derived quantities table
    #[structopt(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: String,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();

    // load model
    let mut input = ModelInput::read_json(&options.model)?;
    let stem = Path::new(&options.model)
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or("cannot get the stem of the model file")?;
    let name = match &input.exports.filename {
        Some(f) => Path::new(f)
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or("cannot get the name of the derived quantities file")?
            .to_string(),
        None => format!("{}.csv", stem),
    };
    let path = Path::new(&options.out_dir).join(name);
    input.exports.filename = Some(path.to_str().ok_or("invalid output path")?.to_string());

    // run
    let mut sim = Simulation::new(&input)?;
    sim.run()?;

    // message
    let path_csv = path.display().to_string();
    let thin_line = format!("{:─^1$}", "", path_csv.len());
    println!("\n\n{}", thin_line);
    println!("simulation completed at t = {:?}; the derived quantities file is:", sim.t);
    println!("{}", path_csv);
    println!("{}\n\n", thin_line);
    Ok(())
}
