//! idcard – register one member and write their ID card.
//!
//! Usage:
//!   idcard --name "Jane Doe" --phone 555-1234 --address "12 Palm St" \
//!          --occupation Teacher --dob 1990-05-17 --passport photo.png [flags]
//!
//! On success writes `{id}_id_card.pdf`, `{id}_id_card.png` and
//! `{id}_id_card.html` into the output directory. Files are staged and only
//! moved into place once all three are written.

use std::{env, fs, path::Path, path::PathBuf, process};

use chrono::NaiveDate;

use idcard_forge::{Asset, Config, Gender, MimeType, Pipeline, RegistrationForm, Submission, Upload};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut form = RegistrationForm::default();
    let mut passport_path: Option<PathBuf> = None;
    let mut logo_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from(".");

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if matches!(arg.as_str(), "--help" | "-h") {
            print_usage(&args[0]);
            process::exit(0);
        }
        if !arg.starts_with("--") {
            eprintln!("Unexpected argument: {arg}");
            print_usage(&args[0]);
            process::exit(1);
        }
        let Some(value) = iter.next() else {
            eprintln!("Missing value for {arg}");
            print_usage(&args[0]);
            process::exit(1);
        };
        match arg.as_str() {
            "--name" => form.name = value.clone(),
            "--phone" => form.phone = value.clone(),
            "--address" => form.address = value.clone(),
            "--occupation" => form.occupation = value.clone(),
            "--motivation" => form.motivation = value.clone(),
            "--branch" => form.branch = value.clone(),
            "--position" => form.position = value.clone(),
            "--gender" => match value.parse::<Gender>() {
                Ok(g) => form.gender = g,
                Err(e) => fail(&e),
            },
            "--dob" => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(d) => form.date_of_birth = Some(d),
                Err(e) => fail(&format!("--dob expects YYYY-MM-DD: {e}")),
            },
            "--passport" => passport_path = Some(PathBuf::from(value)),
            "--logo" => logo_path = Some(PathBuf::from(value)),
            "--config" => config_path = Some(PathBuf::from(value)),
            "--out" => out_dir = PathBuf::from(value),
            other => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let config = match &config_path {
        Some(path) => Config::load(path).unwrap_or_else(|e| fail(&format!("{}: {e}", path.display()))),
        None => Config::default(),
    };

    if let Some(path) = &passport_path {
        form.passport = Some(read_upload(path));
    }

    // Without --logo, a logo.png beside the working directory is used if present.
    let logo_path = logo_path.unwrap_or_else(|| PathBuf::from("logo.png"));
    let logo = Asset::read_optional(&logo_path)
        .unwrap_or_else(|e| fail(&format!("logo '{}': {e}", logo_path.display())));

    let mut pipeline = Pipeline::new(config);
    pipeline.set_logo(logo);

    let record = match pipeline.submit(&form) {
        Ok(Submission::Accepted(record)) => record,
        Ok(Submission::Rejected(failure)) => {
            eprintln!("{} ({})", failure.message, failure.field);
            process::exit(2);
        }
        Err(e) => fail(&e.to_string()),
    };

    let card = pipeline.render().unwrap_or_else(|e| fail(&e.to_string()));

    let written = card.write_to(&out_dir).unwrap_or_else(|e| fail(&e.to_string()));
    for path in &written {
        eprintln!("Wrote '{}'", path.display());
    }
    match record.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("exporting record: {e}")),
    }
}

/// Read the passport as the form would receive it. The declared type comes
/// from the file content; unknown content is left for validation to reject.
fn read_upload(path: &Path) -> Upload {
    let bytes = fs::read(path).unwrap_or_else(|e| fail(&format!("reading '{}': {e}", path.display())));
    let mime = MimeType::sniff(&bytes)
        .map(|m| m.as_str())
        .unwrap_or("application/octet-stream");
    Upload::new(bytes, mime)
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("idcard – membership registration and ID card generator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} --name <name> --phone <phone> --address <address> --occupation <job> \\");
    eprintln!("     --dob <YYYY-MM-DD> --passport <photo> [flags]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --gender       Male | Female (default: Male)");
    eprintln!("  --branch       Uyo | Aksu | Eket (default: Uyo)");
    eprintln!("  --position     Pastor | Evangelist | Deacon | Deaconess | Unit Head | Worker | Member");
    eprintln!("  --motivation   What drew the member to join");
    eprintln!("  --logo         Organisation logo (default: ./logo.png if present)");
    eprintln!("  --config       JSON config file");
    eprintln!("  --out          Output directory (default: .)");
    eprintln!("  --help         Print this message");
}
