use std::env;
use std::process;

use keyfilter::{run, Mode, RunConfig};

const USAGE: &str =
    "usage: keyfilter --input <keys> --file <data> [--deletion] [--mode broadcast|set-difference]";

fn parse_args() -> Result<RunConfig, String> {
    let mut config = RunConfig::new("", "");

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => config.keys_path = args.next().ok_or("--input needs a value")?,
            "--file" => config.data_path = args.next().ok_or("--file needs a value")?,
            "--deletion" => config.replace = true,
            "--mode" => {
                config.mode = match args.next().as_deref() {
                    Some("broadcast") => Mode::Broadcast,
                    Some("set-difference") => Mode::SetDifference,
                    other => return Err(format!("unknown mode {other:?}")),
                }
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(config)
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
