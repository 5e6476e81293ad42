use std::env;
use std::process;

mod readme;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.last().unwrap() == "update-readme" {
        readme::update();
    } else {
        eprintln!("ERROR: No task selected");
        process::exit(1);
    }
}
