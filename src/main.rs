/*
This code is part of the ShpTriad Shapefile library.
Created: 16/10/2026
Last Modified: 16/10/2026
License: MIT
*/

/*!
A small driver for the ShpTriad library. Run with no arguments, it writes a
square polygon dataset with NAME and AREA fields into the working directory
and reads it back. Given an input file, it prints a summary of that dataset.

| Command           | Description                                                  |
| ----------------- | ------------------------------------------------------------ |
| --wd, --cd        | Changes the working directory; --wd="/path/to/data/".        |
| -i, --input       | Summarizes an existing dataset; -i="rivers.shp".             |
| -h, --help        | Prints help information.                                     |
| -v                | Verbose mode; logs progress for each file read or written.   |

The --wd and -v settings persist in settings.json in the current directory.
*/

use std::collections::HashMap;
use std::env;
use tracing::{info, Level};
use triad_common::configs::{get_configs, save_configs};
use triad_vector::{
    FieldData, FieldDataType, Point2D, Reader, Result, Shape, ShapeType, Writer,
};

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => panic!("{}", err),
    }
}

fn run() -> Result<()> {
    let mut configs = get_configs()?;
    let mut input_file = String::new();
    let mut configs_modified = false;

    for arg in env::args().skip(1) {
        if arg.starts_with("-h") || arg.starts_with("--help") {
            help();
            return Ok(());
        } else if arg.starts_with("--wd") || arg.starts_with("--cd") {
            configs.working_directory = arg_value(&arg);
            configs_modified = true;
        } else if arg.starts_with("-i") || arg.starts_with("--input") {
            input_file = arg_value(&arg);
        } else if arg == "-v" {
            configs.verbose_mode = true;
            configs_modified = true;
        }
    }

    if configs_modified {
        save_configs(&configs)?;
    }

    let level = if configs.verbose_mode {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();

    if !input_file.is_empty() {
        let input = Reader::open(configs.resolve(&input_file))?;
        print_summary(&input);
        return Ok(());
    }

    let output_file = configs.resolve("test.shp");
    let mut output = Writer::new(&output_file, ShapeType::Polygon)?;
    output.add_field("NAME", FieldDataType::Character, 50, 0)?;
    output.add_field("AREA", FieldDataType::Numeric, 10, 2)?;

    let square: Vec<Point2D> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
        .iter()
        .map(|&p| Point2D::from(p))
        .collect();
    let mut attributes = HashMap::new();
    attributes.insert("NAME".to_string(), FieldData::Text("Square".to_string()));
    attributes.insert("AREA".to_string(), FieldData::Real(100.0));
    output.add_record(Shape::with_part(ShapeType::Polygon, &square), attributes)?;
    output.write()?;
    info!("Output file written: {}", output_file.display());

    let input = Reader::open(&output_file)?;
    print_summary(&input);
    Ok(())
}

fn arg_value(arg: &str) -> String {
    let v = match arg.find('=') {
        Some(i) => &arg[i + 1..],
        None => "",
    };
    v.replace('\"', "").replace('\'', "")
}

fn print_summary(input: &Reader) {
    println!("{}", input.file_name.display());
    println!("{}", input.header);
    println!(
        "{} records, {} parts, {} points",
        input.num_records(),
        input.get_total_num_parts(),
        input.get_total_num_points()
    );
    if let Some(attribute_header) = &input.attribute_header {
        println!("{}", attribute_header);
    }
    for field in &input.fields {
        println!(
            "  {} ({}, {}, {})",
            field.name,
            field.field_type.to_char(),
            field.field_length,
            field.decimal_count
        );
    }
    if let Some((shapes, rows)) = input.row_count_mismatch() {
        println!("warning: {} geometries but {} attribute rows", shapes, rows);
    }
    for (i, record) in input.records.iter().enumerate() {
        let mut values: Vec<String> = record
            .attributes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        values.sort();
        println!("{}: {} [{}]", i + 1, record.shape, values.join(", "));
    }
}

fn help() {
    println!(
        "shp_triad Help

Run with no arguments to write test.shp (a square polygon with NAME and AREA
fields) to the working directory and print it back.

The following commands are recognized:
--wd, --cd     Changes the working directory; --wd=\"/path/to/data/\".
-i, --input    Summarizes an existing dataset; -i=\"rivers.shp\".
-h, --help     Prints help information.
-v             Verbose mode.

Settings are read from settings.json in the current directory when present.
The --wd and -v flags are saved back to that file."
    );
}
