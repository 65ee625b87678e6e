//! Invocation builder.
//!
//! Sections are emitted in this order:
//!
//! 1. `<program> <import|export>`
//! 2. identity: Hadoop generic options, connection, credentials, driver,
//!    source/destination
//! 3. transfer shape
//! 4. text encoding
//! 5. staging (export only)
//! 6. catalog
//! 7. `properties` as `-D key=value`
//! 8. `extra_options` as `--key [value]`
//! 9. connector arguments after `--` (schema)

use crate::config::{present, OptionValue, TransferConfig, TransferMode, ValidatedConfig};
use crate::connection::ConnectionParams;

use super::Invocation;

/// Connection extras forwarded as Hadoop generic options.
///
/// The tool only parses these directly after the command word.
const GENERIC_OPTIONS: &[(&str, &str)] = &[
    ("namenode", "-fs"),
    ("job_tracker", "-jt"),
    ("libjars", "-libjars"),
    ("files", "-files"),
    ("archives", "-archives"),
];

/// Build an invocation of the default `sqoop` program.
pub fn build(config: &ValidatedConfig<'_>, conn: &ConnectionParams) -> Invocation {
    CommandBuilder::default().build(config, conn)
}

/// Builds [`Invocation`]s for a given tool program.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new("sqoop")
    }
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Derive the command line for a validated task.
    pub fn build(&self, validated: &ValidatedConfig<'_>, conn: &ConnectionParams) -> Invocation {
        let config = validated.config();
        let mode = validated.mode();

        let mut args = Args::default();
        args.push(mode.command_word());

        identity(&mut args, mode, config, conn);
        shape(&mut args, mode, config);
        encoding(&mut args, mode, config);
        if mode == TransferMode::Export {
            args.opt("--staging-table", &config.staging_table);
            args.flag("--clear-staging-table", config.clear_staging_table);
        }
        args.opt("--hcatalog-database", &config.hcatalog_database);
        args.opt("--hcatalog-table", &config.hcatalog_table);
        args.flag("--create-hcatalog-table", config.create_hcatalog_table);

        for (key, value) in &config.properties {
            if key.is_empty() {
                continue;
            }
            args.push("-D");
            args.push(format!("{}={}", key, value));
        }

        // An empty key would render as a bare `--` and start connector arguments.
        for (key, value) in config.extra_options.iter().filter(|(k, _)| !k.is_empty()) {
            match value {
                OptionValue::Flag(false) => {}
                OptionValue::Flag(true) | OptionValue::Null => args.push(format!("--{}", key)),
                OptionValue::Int(n) => {
                    args.push(format!("--{}", key));
                    args.push(n.to_string());
                }
                OptionValue::Float(n) => {
                    args.push(format!("--{}", key));
                    args.push(n.to_string());
                }
                OptionValue::Text(text) => {
                    args.push(format!("--{}", key));
                    if !text.is_empty() {
                        args.push(text.as_str());
                    }
                }
            }
        }

        if let Some(schema) = present(&config.schema) {
            args.push("--");
            args.push("--schema");
            args.push(schema);
        }

        Invocation::new(self.program.clone(), args.0)
    }
}

fn identity(
    args: &mut Args,
    mode: TransferMode,
    config: &TransferConfig,
    conn: &ConnectionParams,
) {
    for (key, flag) in GENERIC_OPTIONS {
        if let Some(value) = conn.extra(key) {
            args.pair(flag, value);
        }
    }
    args.push("--connect");
    args.push(conn.connect_string());
    args.opt("--username", &conn.login);
    match conn.extra("password_file") {
        Some(file) => args.pair("--password-file", file),
        None => args.opt("--password", &conn.password),
    }
    args.opt("--driver", &config.driver);

    match mode {
        TransferMode::Import => {
            // Validation guarantees exactly one of the two.
            args.opt("--table", &config.table);
            args.opt("--query", &config.query);
            args.opt("--columns", &config.columns);
            args.opt("--where", &config.where_clause);
        }
        TransferMode::Export => {
            args.opt("--table", &config.table);
            args.opt("--export-dir", &config.export_dir);
            args.opt("--columns", &config.columns);
        }
    }
}

fn shape(args: &mut Args, mode: TransferMode, config: &TransferConfig) {
    if mode == TransferMode::Import {
        args.opt("--target-dir", &config.target_dir);
        args.flag("--append", config.append);
        if let Some(format) = config.file_type {
            args.push(format.flag());
        }
    }
    if let Some(mappers) = config.num_mappers {
        args.pair("--num-mappers", &mappers.to_string());
    }
    if mode == TransferMode::Import {
        args.opt("--split-by", &config.split_by);
    }
    args.flag("--direct", config.direct);
    match mode {
        TransferMode::Import => args.flag("--relaxed-isolation", config.relaxed_isolation),
        TransferMode::Export => args.flag("--batch", config.batch),
    }
    args.flag("--verbose", config.verbose);
}

fn encoding(args: &mut Args, mode: TransferMode, config: &TransferConfig) {
    let (fields, lines, optionally, null_string, null_non_string) = match mode {
        TransferMode::Import => (
            "--fields-terminated-by",
            "--lines-terminated-by",
            "--optionally-enclosed-by",
            "--null-string",
            "--null-non-string",
        ),
        TransferMode::Export => (
            "--input-fields-terminated-by",
            "--input-lines-terminated-by",
            "--input-optionally-enclosed-by",
            "--input-null-string",
            "--input-null-non-string",
        ),
    };

    args.opt(fields, &config.fields_terminated_by);
    args.opt(lines, &config.lines_terminated_by);
    args.opt("--enclosed-by", &config.enclosed_by);
    args.opt(optionally, &config.optionally_enclosed_by);
    args.opt("--escaped-by", &config.escaped_by);
    args.opt(null_string, &config.null_string);
    args.opt(null_non_string, &config.null_non_string);
}

#[derive(Default)]
struct Args(Vec<String>);

impl Args {
    fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    fn pair(&mut self, flag: &str, value: &str) {
        self.push(flag);
        self.push(value);
    }

    fn opt(&mut self, flag: &str, value: &Option<String>) {
        if let Some(value) = present(value) {
            self.pair(flag, value);
        }
    }

    fn flag(&mut self, flag: &str, enabled: bool) {
        if enabled {
            self.push(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileFormat;

    fn conn() -> ConnectionParams {
        ConnectionParams::new("jdbc:mysql://db.example.com")
    }

    fn build_ok(config: &TransferConfig) -> Invocation {
        let validated = config.validated().expect("config should be valid");
        build(&validated, &conn())
    }

    fn tokens(inv: &Invocation) -> Vec<&str> {
        inv.tokens().collect()
    }

    /// Every field of the task set, export mode.
    fn full_export() -> TransferConfig {
        let mut config = TransferConfig {
            table: Some("target_table".into()),
            query: Some("SELECT * FROM schema.table".into()),
            target_dir: Some("/path/on/hdfs/to/import".into()),
            append: true,
            file_type: Some(FileFormat::Avro),
            columns: Some("a,b,c".into()),
            num_mappers: Some(22),
            split_by: Some("id".into()),
            export_dir: Some("/path/on/hdfs/to/export".into()),
            null_string: Some("\n".into()),
            null_non_string: Some("\t".into()),
            staging_table: Some("target_table_staging".into()),
            clear_staging_table: true,
            enclosed_by: Some("\"".into()),
            escaped_by: Some("\\".into()),
            fields_terminated_by: Some("|".into()),
            lines_terminated_by: Some("\n".into()),
            optionally_enclosed_by: Some("\"".into()),
            batch: true,
            relaxed_isolation: true,
            direct: true,
            driver: Some("com.microsoft.jdbc.sqlserver.SQLServerDriver".into()),
            create_hcatalog_table: true,
            hcatalog_database: Some("hive_database".into()),
            hcatalog_table: Some("hive_table".into()),
            schema: Some("myschema".into()),
            ..TransferConfig::export()
        };
        config
            .properties
            .insert("mapred.map.max.attempts".into(), "1".into());
        config.extra_options.insert("update-key".into(), "id".into());
        config
            .extra_options
            .insert("update-mode".into(), "allowinsert".into());
        config.extra_options.insert("fetch-size".into(), OptionValue::Int(1));
        config
    }

    #[test]
    fn test_export_table_direct() {
        let config = TransferConfig {
            table: Some("T".into()),
            direct: true,
            ..TransferConfig::export()
        };
        let inv = build_ok(&config);

        assert_eq!(
            tokens(&inv),
            vec![
                "sqoop",
                "export",
                "--connect",
                "jdbc:mysql://db.example.com",
                "--table",
                "T",
                "--direct",
            ]
        );
        let export = inv.position("export").unwrap();
        let table = inv.position("--table").unwrap();
        let direct = inv.position("--direct").unwrap();
        assert!(export < table && table < direct);
        assert_eq!(inv.value_of("--table"), Some("T"));
        assert!(inv.position("--staging-table").is_none());
        assert!(inv.position("--clear-staging-table").is_none());
        assert!(inv.position("--hcatalog-database").is_none());
        assert!(inv.position("--create-hcatalog-table").is_none());
    }

    #[test]
    fn test_full_export_order() {
        let inv = build_ok(&full_export());
        assert_eq!(
            tokens(&inv),
            vec![
                "sqoop",
                "export",
                "--connect",
                "jdbc:mysql://db.example.com",
                "--driver",
                "com.microsoft.jdbc.sqlserver.SQLServerDriver",
                "--table",
                "target_table",
                "--export-dir",
                "/path/on/hdfs/to/export",
                "--columns",
                "a,b,c",
                "--num-mappers",
                "22",
                "--direct",
                "--batch",
                "--input-fields-terminated-by",
                "|",
                "--input-lines-terminated-by",
                "\n",
                "--enclosed-by",
                "\"",
                "--input-optionally-enclosed-by",
                "\"",
                "--escaped-by",
                "\\",
                "--input-null-string",
                "\n",
                "--input-null-non-string",
                "\t",
                "--staging-table",
                "target_table_staging",
                "--clear-staging-table",
                "--hcatalog-database",
                "hive_database",
                "--hcatalog-table",
                "hive_table",
                "--create-hcatalog-table",
                "-D",
                "mapred.map.max.attempts=1",
                "--update-key",
                "id",
                "--update-mode",
                "allowinsert",
                "--fetch-size",
                "1",
                "--",
                "--schema",
                "myschema",
            ]
        );
    }

    #[test]
    fn test_import_ignores_export_only_fields() {
        let mut config = full_export();
        config.cmd_type = "import".into();
        config.query = None;
        let inv = build_ok(&config);

        assert_eq!(inv.args()[0], "import");
        assert_eq!(inv.value_of("--target-dir"), Some("/path/on/hdfs/to/import"));
        assert!(inv.position("--append").is_some());
        assert!(inv.position("--as-avrodatafile").is_some());
        assert_eq!(inv.value_of("--split-by"), Some("id"));
        assert!(inv.position("--relaxed-isolation").is_some());
        assert_eq!(inv.value_of("--fields-terminated-by"), Some("|"));
        assert_eq!(inv.value_of("--null-string"), Some("\n"));

        for flag in [
            "--export-dir",
            "--staging-table",
            "--clear-staging-table",
            "--batch",
            "--input-fields-terminated-by",
            "--input-null-string",
        ] {
            assert!(inv.position(flag).is_none(), "{} should not be emitted", flag);
        }
    }

    #[test]
    fn test_import_query_with_catalog() {
        let mut config = TransferConfig {
            query: Some("select name, age from company where $CONDITIONS".into()),
            split_by: Some("age".into()),
            verbose: true,
            hcatalog_database: Some("default".into()),
            hcatalog_table: Some("import_table_2".into()),
            create_hcatalog_table: true,
            ..TransferConfig::import()
        };
        config
            .extra_options
            .insert("hcatalog-storage-stanza".into(), "\"stored as orcfile\"".into());

        let inv = build_ok(&config);
        assert_eq!(
            inv.args(),
            &[
                "import",
                "--connect",
                "jdbc:mysql://db.example.com",
                "--query",
                "select name, age from company where $CONDITIONS",
                "--split-by",
                "age",
                "--verbose",
                "--hcatalog-database",
                "default",
                "--hcatalog-table",
                "import_table_2",
                "--create-hcatalog-table",
                "--hcatalog-storage-stanza",
                "\"stored as orcfile\"",
            ]
        );
        assert!(inv.position("--table").is_none());
    }

    #[test]
    fn test_unset_fields_emit_nothing() {
        let config = TransferConfig {
            table: Some("company".into()),
            target_dir: Some(String::new()),
            split_by: Some(String::new()),
            ..TransferConfig::import()
        };
        let inv = build_ok(&config);
        assert_eq!(
            tokens(&inv),
            vec![
                "sqoop",
                "import",
                "--connect",
                "jdbc:mysql://db.example.com",
                "--table",
                "company",
            ]
        );
        assert!(inv.args().iter().all(|a| !a.is_empty()));
    }

    #[test]
    fn test_extra_option_values() {
        let mut config = TransferConfig {
            table: Some("company".into()),
            ..TransferConfig::import()
        };
        config.extra_options.insert("hive-import".into(), true.into());
        config.extra_options.insert("hive-overwrite".into(), false.into());
        config.extra_options.insert("fetch-size".into(), OptionValue::Int(1000));
        config.extra_options.insert("delete-target-dir".into(), "".into());
        config.extra_options.insert("hive-partition-key".into(), "day".into());

        let inv = build_ok(&config);
        assert_eq!(
            &inv.args()[5..],
            &[
                "--hive-import",
                "--fetch-size",
                "1000",
                "--delete-target-dir",
                "--hive-partition-key",
                "day",
            ]
        );
    }

    #[test]
    fn test_extra_option_scalars() {
        let mut config = TransferConfig {
            table: Some("company".into()),
            ..TransferConfig::import()
        };
        config.extra_options.insert("sample-ratio".into(), OptionValue::Float(1.5));
        config.extra_options.insert("hive-drop-import-delims".into(), OptionValue::Null);

        let inv = build_ok(&config);
        assert_eq!(
            &inv.args()[5..],
            &["--sample-ratio", "1.5", "--hive-drop-import-delims"]
        );
    }

    #[test]
    fn test_empty_keys_are_skipped() {
        let mut config = TransferConfig {
            table: Some("company".into()),
            schema: Some("myschema".into()),
            ..TransferConfig::import()
        };
        config.extra_options.insert(String::new(), "x".into());
        config.extra_options.insert("fetch-size".into(), OptionValue::Int(10));
        config.properties.insert(String::new(), "1".into());

        let inv = build_ok(&config);
        assert_eq!(
            &inv.args()[5..],
            &["--fetch-size", "10", "--", "--schema", "myschema"]
        );
        assert_eq!(inv.args().iter().filter(|a| a.as_str() == "--").count(), 1);
        assert!(inv.position("-D").is_none());
    }

    #[test]
    fn test_properties_keep_insertion_order() {
        let mut config = TransferConfig {
            table: Some("company".into()),
            ..TransferConfig::import()
        };
        for (key, value) in [("z.last", "1"), ("a.first", "2"), ("m.middle", "3")] {
            config.properties.insert(key.into(), value.into());
        }

        let inv = build_ok(&config);
        assert_eq!(
            &inv.args()[5..],
            &["-D", "z.last=1", "-D", "a.first=2", "-D", "m.middle=3"]
        );
    }

    #[test]
    fn test_connection_credentials_and_generic_options() {
        let mut conn = conn();
        conn.port = Some(3306);
        conn.schema = Some("sales".into());
        conn.login = Some("etl".into());
        conn.password = Some("hunter2".into());
        conn.extra.insert("job_tracker".into(), "rm:8032".into());
        conn.extra.insert("namenode".into(), "hdfs://nn:8020".into());

        let config = TransferConfig {
            table: Some("company".into()),
            ..TransferConfig::import()
        };
        let inv = build(&config.validated().unwrap(), &conn);
        assert_eq!(
            inv.args(),
            &[
                "import",
                "-fs",
                "hdfs://nn:8020",
                "-jt",
                "rm:8032",
                "--connect",
                "jdbc:mysql://db.example.com:3306/sales",
                "--username",
                "etl",
                "--password",
                "hunter2",
                "--table",
                "company",
            ]
        );
        assert!(!inv.masked().contains("hunter2"));
    }

    #[test]
    fn test_password_file_takes_precedence() {
        let mut conn = conn();
        conn.password = Some("hunter2".into());
        conn.extra
            .insert("password_file".into(), "/user/etl/.password".into());

        let config = TransferConfig {
            table: Some("company".into()),
            ..TransferConfig::import()
        };
        let inv = build(&config.validated().unwrap(), &conn);
        assert_eq!(inv.value_of("--password-file"), Some("/user/etl/.password"));
        assert!(inv.position("--password").is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = full_export();
        let first = build_ok(&config);
        let second = build_ok(&config.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_program() {
        let config = TransferConfig {
            table: Some("T".into()),
            ..TransferConfig::export()
        };
        let inv = CommandBuilder::new("/opt/sqoop/bin/sqoop")
            .build(&config.validated().unwrap(), &conn());
        assert_eq!(inv.program(), "/opt/sqoop/bin/sqoop");
    }
}
