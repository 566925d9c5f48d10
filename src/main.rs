#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;

use Examples::equilibrium_examples::equilibrium_examples;
use Examples::surface_kinetics_examples::surface_kinetics_examples;
use Utils::load_from_file::load_task;
use Utils::logger::init_logger;
use log::{LevelFilter, error, info};

fn run_task_file(file_name: &str) {
    let outcome = load_task(file_name).and_then(|task| task.run());
    match outcome {
        Ok(outcome) => {
            if let Some(prob) = &outcome.equilibrium {
                for k in 0..prob.nspecies {
                    println!("{:>16} {:>14.6e}", prob.sp_name[k], prob.w[k]);
                }
            }
            if let Some(kin) = &outcome.kinetics {
                if let Some(theta) = kin
                    .surface_phase_index()
                    .and_then(|n| kin.thermo(n).coverages())
                {
                    println!("surface coverages: {:?}", theta);
                }
            }
            info!("task '{}' done", file_name);
        }
        Err(e) => error!("task '{}' failed: {}", file_name, e),
    }
}

pub fn main() {
    init_logger(LevelFilter::Info);
    // a task file on the command line is run instead of the examples
    if let Some(file_name) = std::env::args().nth(1) {
        run_task_file(&file_name);
        return;
    }
    let task: usize = 1;
    equilibrium_examples(task);
    surface_kinetics_examples(task);
}
