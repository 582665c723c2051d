// Copyright (c) 2025 The AmlDump Authors. All rights reserved.
//
// AmlDump is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

mod logger;

use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};

const BINARY_NAME: &str = "amldump";

fn print_help() {
    println!(
        "Usage: {} <input>\n\
        \n\
        Decode an AML table (DSDT/SSDT) and dump its namespace.\n\
        \n\
        Arguments:\n\
        \x20 <input>         Path to the AML table file, or '-' for standard input.\n\
        \n\
        Options:\n\
        \x20 -h, --help      Print this help.\n\
        \x20 -v, --version   Print version information.\n\
        \n\
        The AMLDUMP_LOG_LEVEL environment variable (error/warn/info/debug/trace)\n\
        controls diagnostic verbosity.",
        BINARY_NAME
    );
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    if input == "-" {
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Failed to read standard input")?;
    } else {
        File::open(input)
            .and_then(|mut file| file.read_to_end(&mut data))
            .with_context(|| format!("Failed to read {}", input))?;
    }
    Ok(data)
}

fn run(input: &str) -> Result<()> {
    let data = read_input(input)?;
    let table = acpi::interpret(&data)?;
    table
        .print_namespace(&mut io::stderr().lock())
        .context("Failed to write namespace dump")?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!(
            "{0}: Not enough arguments\n\
            Try '{0} --help' for more information",
            BINARY_NAME
        );
        process::exit(1);
    }

    match args[1].as_str() {
        "-h" | "--help" => print_help(),
        "-v" | "--version" => {
            println!("{} version {}", BINARY_NAME, env!("CARGO_PKG_VERSION"));
        }
        input => {
            if let Err(e) = logger::init() {
                println!("{}: Failed to install logger: {:?}", BINARY_NAME, e);
            }
            if let Err(e) = run(input) {
                println!("{}: {:?}", BINARY_NAME, e);
                process::exit(1);
            }
        }
    }
}
