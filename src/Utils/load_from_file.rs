use crate::Utils::task_config::{
    Conditions, ConfigError, EquilibriumConfig, KineticsConfig, PhaseConfig, TaskConfig,
};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct LoadData {
    pub file_name: String,
}

impl LoadData {
    pub fn new(file_name: String) -> Self {
        LoadData { file_name }
    }
    pub fn load_task(&self) -> Result<TaskConfig, ConfigError> {
        load_task(&self.file_name)
    }
}

fn read_lines(file_name: &str) -> Result<Vec<String>, ConfigError> {
    let path = Path::new(file_name);
    let file = File::open(path).map_err(|e| ConfigError::Io {
        path: file_name.to_string(),
        source: e,
    })?;
    let reader = BufReader::new(file);
    reader
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| ConfigError::Io {
            path: file_name.to_string(),
            source: e,
        })
}

/// Finds a section of the file that starts after one of `headers` (case insensitive) and runs
/// to the next all-uppercase header line or the end of the file.
/// Returns the index of the first line of the section and the index one past its last line.
pub fn find_section(lines: &[String], headers: &[&str]) -> Option<(usize, usize)> {
    let start_index = lines
        .iter()
        .position(|line| {
            let trimmed = line.trim().to_uppercase();
            headers.iter().any(|h| trimmed == *h)
        })
        .map(|i| i + 1)?;
    let mut end_index = lines.len();
    for (i, line) in lines.iter().enumerate().skip(start_index) {
        let trimmed = line.trim();
        if !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_uppercase() || c == '_' || c == ' ')
        {
            end_index = i;
            break;
        }
    }
    Some((start_index, end_index))
}

/// Parses the JSON of one section. Errors point at the line of the file, and the offending
/// line is logged with a marker under the column.
fn parse_section<T: DeserializeOwned>(
    lines: &[String],
    (start_index, end_index): (usize, usize),
    section: &str,
    file_name: &str,
) -> Result<T, ConfigError> {
    let text = lines[start_index..end_index].join("\n");
    match serde_json::from_str::<T>(&text) {
        Ok(data) => {
            info!("Successfully parsed {} section of file '{}'", section, file_name);
            Ok(data)
        }
        Err(e) => {
            let error_line = e.line();
            let error_column = e.column();
            // line in the file, counted from 1
            let actual_line = start_index + error_line.max(1);
            let msg = format!(
                "Error parsing {} at line {}, column {} (line {} in file): {}",
                section, error_line, error_column, actual_line, e
            );
            error!("{}", msg);
            if let Some(problem_line) = lines.get(actual_line - 1) {
                error!("Problematic line: {}", problem_line);
                if error_column >= 1 && error_column <= problem_line.len() {
                    let pointer = " ".repeat(error_column - 1) + "^";
                    error!("{}", pointer);
                }
            }
            Err(ConfigError::Parse {
                section: section.to_string(),
                line: actual_line,
                column: error_column,
                message: e.to_string(),
            })
        }
    }
}

/// Loads a calculation task.
///
/// The file is either one JSON document with the fields of [`TaskConfig`], or a text file
/// with sections, each a header line followed by JSON:
/// ```text
/// CONDITIONS
/// {"T": 1000.0, "P": 101325.0}
/// PHASES
/// [ {"name": "gas", "model": "IdealGas", "species": [...]} ]
/// EQUILIBRIUM
/// {"initial_moles": {"CO": 1.0}}
/// KINETICS
/// {"kind": "Interface", "reactions": [...]}
/// ```
/// PHASES is required, the other sections are optional.
pub fn load_task(file_name: &str) -> Result<TaskConfig, ConfigError> {
    let lines = read_lines(file_name)?;
    let first = lines.iter().map(|l| l.trim()).find(|l| !l.is_empty());
    let task = if first.is_some_and(|l| l.starts_with('{')) {
        parse_section::<TaskConfig>(&lines, (0, lines.len()), "task", file_name)?
    } else {
        let phases_at = find_section(&lines, &["PHASES"])
            .ok_or_else(|| ConfigError::MissingSection("PHASES".to_string()))?;
        let phases: Vec<PhaseConfig> = parse_section(&lines, phases_at, "PHASES", file_name)?;
        let conditions: Conditions = match find_section(&lines, &["CONDITIONS", "STATE"]) {
            Some(at) => parse_section(&lines, at, "CONDITIONS", file_name)?,
            None => {
                warn!("no CONDITIONS section in '{}', using 298.15 K and 1 atm", file_name);
                Conditions::default()
            }
        };
        let equilibrium: Option<EquilibriumConfig> = find_section(&lines, &["EQUILIBRIUM"])
            .map(|at| parse_section(&lines, at, "EQUILIBRIUM", file_name))
            .transpose()?;
        let kinetics: Option<KineticsConfig> = find_section(&lines, &["KINETICS", "REACTIONS"])
            .map(|at| parse_section(&lines, at, "KINETICS", file_name))
            .transpose()?;
        TaskConfig {
            conditions,
            phases,
            equilibrium,
            kinetics,
        }
    };
    validate_task(&task, file_name);
    Ok(task)
}

/// Logs suspicious but loadable content.
fn validate_task(task: &TaskConfig, file_name: &str) {
    if task.phases.is_empty() {
        warn!("Task in '{}' defines no phases", file_name);
    }
    for phase in &task.phases {
        if phase.species.is_empty() {
            warn!("Phase '{}' contains no species", phase.name);
        }
        if let Some(x) = &phase.composition {
            if x.len() != phase.species.len() {
                warn!(
                    "Phase '{}': composition has {} entries for {} species",
                    phase.name,
                    x.len(),
                    phase.species.len()
                );
            }
        }
    }
    if let Some(kin) = &task.kinetics {
        if kin.reactions.is_empty() {
            warn!("Kinetics section of '{}' contains no reactions", file_name);
        }
    }
    info!(
        "Loaded task from '{}': {} phases, equilibrium: {}, kinetics: {}",
        file_name,
        task.phases.len(),
        task.equilibrium.is_some(),
        task.kinetics.is_some()
    );
}
