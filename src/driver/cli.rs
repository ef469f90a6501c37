//! CLI argument parsing.
//!
//! A flat `match` over the argument list; no parser library. The grammar is
//! two positional paths plus two flags:
//!
//! ```text
//! elf2rpl <options> src dst
//!   -r, --rpl     Generate an RPL instead of an RPX
//!   -H, --help    Show help
//! ```

use super::pipeline::Driver;

impl Driver {
    /// Parse command-line arguments and populate driver fields.
    /// Returns `Ok(true)` if early exit was handled (help, or missing
    /// positionals, which print usage), `Ok(false)` if conversion should
    /// proceed, or `Err` for invalid arguments.
    pub fn parse_cli_args(&mut self, args: &[String]) -> Result<bool, String> {
        let mut positionals: Vec<&String> = Vec::new();
        let mut show_help = false;

        for arg in &args[1..] {
            match arg.as_str() {
                "-H" | "--help" => show_help = true,
                "-r" | "--rpl" => self.is_rpl = true,
                _ if arg.starts_with('-') => {
                    return Err(format!("unknown option: {}", arg));
                }
                _ => positionals.push(arg),
            }
        }

        if positionals.len() > 2 {
            return Err(format!("unexpected argument: {}", positionals[2]));
        }

        if show_help || positionals.len() < 2 {
            print_usage(&args[0]);
            return Ok(true);
        }

        self.src = positionals[0].clone();
        self.dst = positionals[1].clone();
        Ok(false)
    }
}

fn print_usage(program: &str) {
    println!("{} <options> src dst", program);
    println!("  src           Path to input elf file");
    println!("  dst           Path to output rpl file");
    println!("  -r, --rpl     Generate an RPL instead of an RPX");
    println!("  -H, --help    Show help.");
}
