use russell_lab::{approx_eq, Vector};
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;
use trapsim::base::{Material, Materials, ParamMesh, QuantityKind, DEFAULT_TEST_DIR};
use trapsim::fem::{shared, DerivedQuantity, DerivedQuantityCollection, Filtered};
use trapsim::fem::{Function, FunctionSpace, MaterialProperties, SurfaceMeasure, VolumeMeasure};
use trapsim::StrError;

fn collection() -> DerivedQuantityCollection {
    DerivedQuantityCollection::new(vec![
        DerivedQuantity::surface_flux("solute", 1),
        DerivedQuantity::total_volume("solute", 1),
        DerivedQuantity::total_volume("1", 2),
        DerivedQuantity::maximum_volume("retention", 1),
        DerivedQuantity::average_surface("T", 2),
    ])
}

#[test]
fn test_header_has_time_and_titles() {
    let c = collection();
    let header = c.make_header();
    assert_eq!(header.len(), c.len() + 1);
    assert_eq!(header[0], "t(s)");
    assert_eq!(header[1], "Flux surface 1: solute");
    assert_eq!(header[3], "Total 1 volume 2");
    assert_eq!(header[5], "Average T surface 2");
    assert_eq!(DerivedQuantityCollection::new(Vec::new()).make_header(), &["t(s)"]);
}

#[test]
fn test_filter_laws() {
    let c = collection();

    // identity
    match c.filter(None, None, None, None) {
        Filtered::Many(all) => assert_eq!(all.len(), 5),
        Filtered::One(..) => panic!("the whole collection should be returned"),
    }

    // single match is unwrapped
    match c.filter(Some(&["retention"]), None, None, None) {
        Filtered::One(q) => assert_eq!(q.kind, QuantityKind::MaximumVolume),
        Filtered::Many(..) => panic!("a single quantity should match"),
    }

    // no match
    assert!(c.filter(Some(&["2"]), None, None, None).is_empty());

    // conjunctive criteria
    assert!(c.filter(None, Some(&[1, 2]), Some(&[3]), None).is_empty());
    assert_eq!(
        c.filter(Some(&["solute"]), None, Some(&[1, 3]), None).titles(),
        &["Total solute volume 1"]
    );
    assert_eq!(
        c.filter(None, None, Some(&[1, 2]), Some(&[QuantityKind::TotalVolume])).titles(),
        &["Total solute volume 1", "Total 1 volume 2"]
    );
    assert_eq!(
        c.filter(Some(&["solute", "T"]), Some(&[1, 2]), None, None).titles(),
        &["Flux surface 1: solute", "Average T surface 2"]
    );
    let kind = QuantityKind::SurfaceFlux;
    assert_eq!(c.filter(None, None, None, Some(std::slice::from_ref(&kind))).len(), 1);
}

#[test]
fn test_filter_by_surface_and_kinds() {
    // one flux per surface
    let c = DerivedQuantityCollection::new(vec![
        DerivedQuantity::surface_flux("solute", 1),
        DerivedQuantity::surface_flux("T", 2),
    ]);
    match c.filter(None, Some(&[1]), None, None) {
        Filtered::One(q) => {
            assert_eq!(q.kind, QuantityKind::SurfaceFlux);
            assert_eq!(q.field, "solute");
            assert_eq!(q.surface(), Some(1));
        }
        Filtered::Many(..) => panic!("a single quantity should match"),
    }

    // two kinds on the same surface
    let c = DerivedQuantityCollection::new(vec![
        DerivedQuantity::total_surface("solute", 1),
        DerivedQuantity::surface_flux("solute", 1),
        DerivedQuantity::surface_flux("solute", 2),
        DerivedQuantity::total_volume("solute", 1),
    ]);
    let kinds = [QuantityKind::TotalSurface, QuantityKind::SurfaceFlux];
    match c.filter(Some(&["solute"]), Some(&[1]), None, Some(&kinds[..])) {
        Filtered::Many(found) => {
            assert_eq!(found.len(), 2);
            assert_eq!(found[0].kind, QuantityKind::TotalSurface);
            assert_eq!(found[1].kind, QuantityKind::SurfaceFlux);
            assert!(found.iter().all(|q| q.surface() == Some(1)));
        }
        Filtered::One(..) => panic!("both quantities should match"),
    }
}

#[test]
fn test_filename_must_be_csv() {
    assert_eq!(
        DerivedQuantityCollection::with_filename(Vec::new(), "coucou").err(),
        Some("filename must end with .csv")
    );
    let mut c = collection();
    assert_eq!(c.set_filename("").err(), Some("filename must be a non-empty string"));
    assert_eq!(c.filename, None);
    assert_eq!(c.write(), Ok(()));
}

#[test]
fn test_compute_and_write_round_trip() -> Result<(), StrError> {
    //  {1}                 {2}
    //   0-----1-----2-----3-----4
    //     (1)   (1)   (2)   (2)
    let mut p = ParamMesh::uniform(4, 2.0);
    p.volume(1, 0.0, 1.0).volume(2, 1.0, 2.0).surface(1, 0.0).surface(2, 2.0);
    let space = Rc::new(FunctionSpace::new(p.generate()?)?);
    let dx = VolumeMeasure::new(&space);
    let ds = SurfaceMeasure::new(&space);
    let materials = Materials::new(vec![Material::new(1, "w", 3.0, 0.0), Material::new(2, "cu", 1.0, 0.0)])?;
    let props = MaterialProperties::new(&materials, &space)?;
    let temperature = shared(Function::constant("T", 5, 300.0));
    props.update(&temperature.borrow(), &space);

    let solute = shared(Function::new("solute", 5));
    let mut functions = HashMap::new();
    functions.insert("solute".to_string(), solute.clone());
    functions.insert("1".to_string(), shared(Function::constant("1", 5, 0.5)));
    functions.insert("retention".to_string(), shared(Function::constant("retention", 5, 3.0)));
    functions.insert("T".to_string(), temperature.clone());

    let filename = format!("{}/derived_quantities_round_trip.csv", DEFAULT_TEST_DIR);
    let mut c = collection();
    c.set_filename(&filename)?;
    c.bind_measures(&dx, &ds)?;
    c.bind_material_properties(&props);
    c.bind_functions(&functions)?;
    c.bind_temperature(&temperature);

    // u = 4 − 2x
    solute.borrow_mut().values = Vector::from(&[4.0, 3.0, 2.0, 1.0, 0.0]);
    c.compute(0.1)?;
    // u = 2 (4 − 2x)
    solute.borrow_mut().values = Vector::from(&[8.0, 6.0, 4.0, 2.0, 0.0]);
    c.compute(0.2)?;
    for (i, row) in c.data.iter().enumerate() {
        assert_eq!(row.len(), c.make_header().len());
        assert_eq!(row[0], 0.1 * ((i + 1) as f64));
    }
    // −D ∇u·n at x = 0 with ∇u·n = 2 (i + 1)
    approx_eq(c.data[0][1], -6.0, 1e-14);
    approx_eq(c.data[1][1], -12.0, 1e-14);
    approx_eq(c.data[1][2], 6.0, 1e-14);
    approx_eq(c.data[1][3], 0.5, 1e-14);
    assert_eq!(c.data[1][4], 3.0);
    assert_eq!(c.data[1][5], 300.0);
    assert_eq!(c[0].data, &[c.data[0][1], c.data[1][1]]);
    approx_eq(c.get("solute", Some(1), None)?, -12.0, 1e-14);

    // write and read back
    c.write()?;
    let contents = fs::read_to_string(&filename).map_err(|_| "cannot read file")?;
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], c.make_header().join(","));
    for (i, line) in lines[1..].iter().enumerate() {
        let values: Vec<f64> = line.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values, c.data[i]);
    }
    Ok(())
}
