/// eng
/// Loading of calculation tasks from files: either one JSON document or a text file with
/// sections (CONDITIONS, PHASES, EQUILIBRIUM, KINETICS), each a header line followed by JSON.
/// Parse errors are reported with the line of the file they occur in.
pub mod load_from_file;
/// serde description of a task and the builders of phases, equilibrium problems and kinetics
pub mod task_config;
/// simplelog backend for the log macros
pub mod logger;
