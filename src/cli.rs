use clap::Parser;

/// Load `<data-root>/<NAME>.csv` and create the table `<catalog>.<NAME>` from it.
#[derive(Parser, Debug)]
#[command(author, version, about = "Import a CSV file from the data folder as a new catalog table")]
pub struct Args {
    /// CSV filename (without extension) to read from the data folder
    #[arg(long = "input_file", value_name = "NAME")]
    pub input_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn parses_input_file() {
        let args = Args::try_parse_from(["csv-ingest", "--input_file", "sales"]).unwrap();
        assert_eq!(args.input_file, "sales");
    }

    #[test]
    fn input_file_is_required() {
        let err = Args::try_parse_from(["csv-ingest"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = Args::try_parse_from(["csv-ingest", "--input_file", "sales", "--overwrite"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
