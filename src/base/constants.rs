/// Boltzmann constant in eV/K
pub const K_B: f64 = 8.617333262e-5;

/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/trapsim/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/trapsim/test";

/// Defines the title of the time column in the derived quantities table
pub const TIME_COLUMN_TITLE: &str = "t(s)";

/// Defines the tolerance used to locate points by their coordinates
pub const POINT_LOCATION_TOL: f64 = 1e-10;
