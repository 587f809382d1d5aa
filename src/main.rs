//! CLI tool for dumping insider disclosure forms filed as XFA PDFs.
//!
//! Each PDF is parsed as the requested notification form and every mapped
//! field is printed. Set `RUST_LOG=insiderforms=debug` to see what the
//! extractor finds.

use insiderforms::{
    ExtractError, ExtractorConfig, FormKind, NotificationForm, Result, XfaExtractor,
};
use std::path::Path;
use std::{env, process};

struct Options {
    kind: FormKind,
    dump_dir: Option<String>,
    files: Vec<String>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("insiderforms");

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage(program);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let options = match parse_args(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("❌ {message}");
            print_usage(program);
            process::exit(1);
        }
    };

    let mut failed = false;
    for (i, pdf_path) in options.files.iter().enumerate() {
        if i > 0 {
            println!("======");
        }
        println!("{pdf_path}");

        match run_form(pdf_path, &options) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("❌ {pdf_path}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn print_usage(program_name: &str) {
    println!("📄 insiderforms - XFA notification form reader");
    println!();
    println!("USAGE:");
    println!("    {program_name} [OPTIONS] <pdf_file>...");
    println!();
    println!("OPTIONS:");
    println!("    --form <N>         Notification form number, 1-7 (default: 1)");
    println!("    --dump-xml <dir>   Write each file's XFA datasets XML into <dir>");
    println!("    -h, --help         Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    {program_name} XFA_form1.pdf");
    println!("    {program_name} --dump-xml ./xml a.pdf b.pdf");
}

fn parse_args(args: &[String]) -> std::result::Result<Options, String> {
    let mut options = Options {
        kind: FormKind::Form1,
        dump_dir: None,
        files: Vec::new(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--form" => {
                let value = iter.next().ok_or("--form needs a form number")?;
                options.kind = value
                    .parse::<u8>()
                    .ok()
                    .and_then(FormKind::from_number)
                    .ok_or_else(|| format!("unknown form number '{value}'"))?;
            }
            "--dump-xml" => {
                let value = iter.next().ok_or("--dump-xml needs a directory")?;
                options.dump_dir = Some(value.clone());
            }
            other => options.files.push(other.to_string()),
        }
    }

    if options.files.is_empty() {
        return Err("no PDF files given".into());
    }
    Ok(options)
}

fn run_form(pdf_path: &str, options: &Options) -> Result<String> {
    let config = ExtractorConfig {
        debug_xml_path: options.dump_dir.as_ref().map(|dir| dump_path(dir, pdf_path)),
        ..Default::default()
    };

    let extractor = XfaExtractor::with_config(pdf_path, config)?;
    let root = extractor
        .extract()?
        .ok_or(ExtractError::NoXfaDatasets)?;

    NotificationForm::from_xml(options.kind, root).render()
}

/// `<dir>/<pdf stem>.xml`
fn dump_path(dir: &str, pdf_path: &str) -> String {
    let stem = Path::new(pdf_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("datasets");
    Path::new(dir)
        .join(format!("{stem}.xml"))
        .to_string_lossy()
        .into_owned()
}
