//! Coloured overview of an assembled batch, printed to stderr.

use colored::Colorize;
use prototree_core::{DescriptorSet, MessageRef};

pub fn print(set: &DescriptorSet) {
    eprintln!(
        "{} {} file(s)",
        "Assembled descriptor tree".green().bold(),
        set.len()
    );
    for file in set.files() {
        let marker = if file.is_file_to_generate() {
            "●".green()
        } else {
            "○".dimmed()
        };
        eprintln!(
            "  {marker} {} {}",
            file.data().name().bold(),
            format!("({})", file.package()).dimmed()
        );
        for message in file.messages() {
            print_message(message, 2);
        }
        for e in file.enums() {
            eprintln!("    {} {}", "enum".cyan(), e.full_name());
        }
        for service in file.services() {
            eprintln!("    {} {}", "service".cyan(), service.full_name());
            for method in service.methods() {
                let input = method.input().map_or(method.input_type(), |m| m.data().long_name());
                let output = method.output().map_or(method.output_type(), |m| m.data().long_name());
                eprintln!("      {} {}({input}) → {output}", "rpc".cyan(), method.name());
            }
        }
        let imports = file.imports().len();
        if imports > 0 {
            eprintln!("    {} {imports}", "imports".cyan());
        }
    }
}

fn print_message(message: MessageRef<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let options = message.option_extensions();
    let suffix = if options.is_empty() {
        String::new()
    } else {
        format!(" [{} option(s)]", options.len()).yellow().to_string()
    };
    eprintln!(
        "{indent}{} {} {}{suffix}",
        "message".cyan(),
        message.full_name(),
        format!("{} field(s)", message.fields().len()).dimmed()
    );
    for child in message.messages() {
        print_message(child, depth + 1);
    }
}
