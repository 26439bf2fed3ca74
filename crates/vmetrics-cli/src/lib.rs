use clap::{App, Arg, ArgMatches};
use log::info;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use vmetrics::{
    fix_vertical_metrics_with_report, FontCompiler, LineSpacingFactor, Report, Result,
    SfntCompiler, TtxCompiler, VMetricsError,
};

pub fn app(name: &str, description: &'static str) -> App<'static, 'static> {
    App::new(name)
        .about(description)
        .arg(
            Arg::with_name("factor")
                .short("f")
                .long("factor")
                .value_name("PERCENT")
                .help("Extra line spacing, as a percentage of the em")
                .takes_value(true)
                .default_value("10"),
        )
        .arg(
            Arg::with_name("ttx")
                .long("ttx")
                .value_name("PATH")
                .help("Round-trip through the ttx program instead of the built-in compiler")
                .takes_value(true)
                .min_values(0)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .help("Prints what was changed as JSON on stderr"),
        )
        .arg(
            Arg::with_name("in-place")
                .long("in-place")
                .value_name("FILE")
                .help("Fixes each of the given files, overwriting it")
                .takes_value(true)
                .multiple(true)
                .conflicts_with_all(&["INPUT", "OUTPUT"]),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to use")
                .required(false),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Sets the output file to use")
                .required(false),
        )
}

pub fn read_args(name: &str, description: &'static str) -> ArgMatches<'static> {
    app(name, description).get_matches()
}

pub fn line_spacing_factor(matches: &ArgMatches) -> Result<LineSpacingFactor> {
    matches
        .value_of("factor")
        .map_or(Ok(LineSpacingFactor::default()), str::parse)
}

pub fn compiler(matches: &ArgMatches) -> Box<dyn FontCompiler> {
    if matches.is_present("ttx") {
        let compiler = match matches.value_of("ttx") {
            Some(path) => TtxCompiler::new(path),
            None => TtxCompiler::default(),
        };
        info!("Using {}", compiler.program().display());
        Box::new(compiler)
    } else {
        Box::new(SfntCompiler)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> VMetricsError + '_ {
    move |source| VMetricsError::Io {
        source,
        path: path.to_path_buf(),
    }
}

pub fn open_font(matches: &ArgMatches) -> Result<Vec<u8>> {
    match matches.value_of("INPUT") {
        Some(filename) => fs::read(filename).map_err(io_error(Path::new(filename))),
        None => {
            let mut data = vec![];
            io::stdin()
                .read_to_end(&mut data)
                .map_err(io_error(Path::new("<stdin>")))?;
            Ok(data)
        }
    }
}

pub fn save_font(data: &[u8], matches: &ArgMatches) -> Result<()> {
    match matches.value_of("OUTPUT") {
        Some(filename) => {
            let path = Path::new(filename);
            File::create(path)
                .and_then(|mut outfile| outfile.write_all(data))
                .map_err(io_error(path))
        }
        None => io::stdout()
            .write_all(data)
            .map_err(io_error(Path::new("<stdout>"))),
    }
}

/// Fix one font file, overwriting it.
pub fn fix_in_place(
    compiler: &dyn FontCompiler,
    path: &Path,
    line_spacing_factor: LineSpacingFactor,
) -> Result<Option<Report>> {
    let data = fs::read(path).map_err(io_error(path))?;
    let (fixed, report) = fix_vertical_metrics_with_report(compiler, &data, line_spacing_factor)?;
    if report.is_some() {
        fs::write(path, fixed).map_err(io_error(path))?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matches(args: &[&str]) -> ArgMatches<'static> {
        let argv = std::iter::once("ttf-fix-vertical-metrics").chain(args.iter().copied());
        app("ttf-fix-vertical-metrics", "test")
            .get_matches_from_safe(argv)
            .unwrap()
    }

    #[test]
    fn default_factor() {
        let m = matches(&["in.ttf", "out.ttf"]);
        assert_eq!(line_spacing_factor(&m).unwrap(), LineSpacingFactor::default());
        assert_eq!(m.value_of("INPUT"), Some("in.ttf"));
        assert_eq!(m.value_of("OUTPUT"), Some("out.ttf"));
        assert!(!m.is_present("ttx"));
    }

    #[test]
    fn explicit_factor() {
        let m = matches(&["-f", "25", "in.ttf"]);
        assert_eq!(line_spacing_factor(&m).unwrap().percent(), 25);
        let m = matches(&["--factor", "0"]);
        assert!(matches!(
            line_spacing_factor(&m),
            Err(VMetricsError::InvalidArgument { .. })
        ));
        let m = matches(&["--factor", "ten"]);
        assert!(line_spacing_factor(&m).is_err());
    }

    #[test]
    fn ttx_path() {
        let m = matches(&["--ttx", "in.ttf"]);
        assert!(m.is_present("ttx"));
        assert_eq!(m.value_of("ttx"), None);
        assert_eq!(m.value_of("INPUT"), Some("in.ttf"));
        let m = matches(&["--ttx=/opt/bin/ttx", "in.ttf"]);
        assert_eq!(m.value_of("ttx"), Some("/opt/bin/ttx"));
    }

    #[test]
    fn in_place_files() {
        let m = matches(&["--in-place", "a.ttf", "b.ttf"]);
        assert_eq!(
            m.values_of("in-place").unwrap().collect::<Vec<_>>(),
            vec!["a.ttf", "b.ttf"]
        );
    }

    #[test]
    fn fixing_a_missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("vmetrics-cli-no-such-font.ttf");
        let err = fix_in_place(&SfntCompiler, &path, LineSpacingFactor::default()).unwrap_err();
        assert!(matches!(err, VMetricsError::Io { .. }));
    }
}
