pub mod elf;
pub mod rpl;
pub mod driver;

/// Entry point shared with the binary: parse arguments, run the pipeline,
/// and report the failing stage on standard output.
pub fn converter_main() {
    let args: Vec<String> = std::env::args().collect();
    let mut driver = driver::Driver::new();

    match driver.parse_cli_args(&args) {
        Ok(true) => return,
        Ok(false) => {}
        Err(e) => {
            println!("Error parsing options: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = driver.run() {
        println!("ERROR: {}", e);
        std::process::exit(1);
    }
}
