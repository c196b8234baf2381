use idx_reader::{render, IdxFile, OpenOutcome};
use std::env;
use std::io::{self, BufRead};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <images.idx> [labels.idx] [--step]", args[0]);
        std::process::exit(1);
    }

    let step = args.iter().skip(1).any(|arg| arg == "--step");
    let paths: Vec<&String> = args.iter().skip(1).filter(|arg| *arg != "--step").collect();
    let Some(images_path) = paths.first() else {
        eprintln!("ERROR: No IDX file given.");
        std::process::exit(1);
    };

    let images = open_or_exit(images_path);
    let labels = paths.get(1).map(|path| open_or_exit(path));

    println!("{}", images);
    if let Some(labels) = &labels {
        println!("{}", labels);
    }
    println!("{}", "=".repeat(60));

    let samples = images.dimensions().first().copied().unwrap_or(0) as usize;
    let stdin = io::stdin();
    for sample in 0..samples {
        match render::render_sample(&images, sample) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("ERROR: Cannot render sample {}", sample);
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }

        if let Some(labels) = &labels {
            match render::label_of(labels, sample) {
                Ok(label) => println!("Label: {}", label),
                Err(e) => eprintln!("  (no label: {})", e),
            }
        }

        if !step {
            break;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

fn open_or_exit(path: &str) -> IdxFile {
    match IdxFile::open(path) {
        OpenOutcome::Ready(file) => file,
        OpenOutcome::Failed { partial, error } => {
            eprintln!("\nERROR: Failed to read IDX file");
            eprintln!("  {}", error);
            eprintln!("\n{}", partial);
            std::process::exit(1);
        }
    }
}
