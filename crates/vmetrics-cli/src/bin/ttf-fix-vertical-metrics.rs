/*
Normalize the vertical metrics of a font so that lines are spaced the same
in every environment:
    - hhea ascender/descender are grown to fill the em plus the requested
      extra line spacing, and the hhea line gap is zeroed.
    - usWinAscent/usWinDescent follow the hhea values.
    - sTypo* are only touched when they already span more than the em, or
      to carry the line gap for fonts which use one.
*/
use log::error;
use rayon::prelude::*;
use std::path::Path;
use vmetrics::{fix_vertical_metrics_with_report, Report};
use vmetrics_cli::{compiler, fix_in_place, line_spacing_factor, open_font, read_args, save_font};

fn print_report(label: &str, report: &Report) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => eprintln!("{}: {}", label, json),
        Err(e) => error!("Could not serialize report for {}: {}", label, e),
    }
}

fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );
    let matches = read_args(
        "ttf-fix-vertical-metrics",
        "Normalizes the OS/2 and hhea vertical metrics for consistent line spacing",
    );
    let factor = match line_spacing_factor(&matches) {
        Ok(factor) => factor,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let compiler = compiler(&matches);
    let want_report = matches.is_present("report");

    if let Some(files) = matches.values_of("in-place") {
        let files: Vec<&str> = files.collect();
        let failures = files
            .par_iter()
            .map(|file| match fix_in_place(compiler.as_ref(), Path::new(file), factor) {
                Ok(report) => {
                    if let (true, Some(report)) = (want_report, report) {
                        print_report(file, &report);
                    }
                    0
                }
                Err(e) => {
                    error!("{}: {}", file, e);
                    1
                }
            })
            .sum::<usize>();
        if failures > 0 {
            std::process::exit(1);
        }
        return;
    }

    let result = open_font(&matches)
        .and_then(|data| fix_vertical_metrics_with_report(compiler.as_ref(), &data, factor))
        .and_then(|(data, report)| {
            if let (true, Some(report)) = (want_report, report) {
                print_report(matches.value_of("INPUT").unwrap_or("<stdin>"), &report);
            }
            save_font(&data, &matches)
        });
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
