/// Compatibility flags for DDL issued against older MySQL and MariaDB servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Foreign-key checks are switched off while the schema is synchronised.
    pub disable_foreign_key_constraints_when_migrating: bool,
    /// `DATETIME` columns carry no fractional seconds (unsupported before MySQL 5.6).
    pub disable_datetime_precision: bool,
    /// Indexes are renamed by drop-and-create (no `RENAME INDEX` before MySQL 5.7 / MariaDB).
    pub dont_support_rename_index: bool,
    /// Columns are renamed with `CHANGE` (no `RENAME COLUMN` before MySQL 8 / MariaDB).
    pub dont_support_rename_column: bool,
    /// Width of string columns declared without an explicit size.
    pub default_string_size: u32,
    /// When false, the flags are tightened from the server version after connecting.
    pub skip_initialize_with_version: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            disable_foreign_key_constraints_when_migrating: true,
            disable_datetime_precision: true,
            dont_support_rename_index: true,
            dont_support_rename_column: true,
            default_string_size: 191,
            skip_initialize_with_version: false,
        }
    }
}

impl SchemaOptions {
    /// Adjusts the flags for the server that answered `SELECT VERSION()`.
    /// Flags are only ever switched on, never off.
    pub fn for_server_version(&self, version: &str) -> Self {
        let mut options = self.clone();
        if options.skip_initialize_with_version {
            return options;
        }

        if version.to_ascii_lowercase().contains("mariadb") {
            options.dont_support_rename_index = true;
            options.dont_support_rename_column = true;
            return options;
        }

        let (major, minor) = parse_major_minor(version);
        if (major, minor) < (5, 6) {
            options.disable_datetime_precision = true;
        }
        if (major, minor) < (5, 7) {
            options.dont_support_rename_index = true;
        }
        if major < 8 {
            options.dont_support_rename_column = true;
        }
        options
    }

    pub fn string_column_type(&self, size: Option<u32>) -> String {
        format!("VARCHAR({})", size.unwrap_or(self.default_string_size))
    }

    pub fn datetime_column_type(&self, precision: Option<u8>) -> String {
        match precision {
            Some(p) if !self.disable_datetime_precision && p > 0 => format!("DATETIME({p})"),
            _ => "DATETIME".to_string(),
        }
    }

    /// Statements renaming an index; `columns` is the index column list, e.g. `(email)`.
    pub fn rename_index_sql(&self, table: &str, old: &str, new: &str, columns: &str) -> Vec<String> {
        if self.dont_support_rename_index {
            vec![
                format!("ALTER TABLE `{table}` ADD INDEX `{new}` {columns}"),
                format!("ALTER TABLE `{table}` DROP INDEX `{old}`"),
            ]
        } else {
            vec![format!("ALTER TABLE `{table}` RENAME INDEX `{old}` TO `{new}`")]
        }
    }

    /// Statement renaming a column; `definition` is the full column type, e.g. `VARCHAR(191) NOT NULL`.
    pub fn rename_column_sql(&self, table: &str, old: &str, new: &str, definition: &str) -> String {
        if self.dont_support_rename_column {
            format!("ALTER TABLE `{table}` CHANGE `{old}` `{new}` {definition}")
        } else {
            format!("ALTER TABLE `{table}` RENAME COLUMN `{old}` TO `{new}`")
        }
    }

    /// Statements bracketing a schema sync, `(before, after)`; empty when checks stay on.
    pub fn foreign_key_checks_sql(&self) -> Option<(&'static str, &'static str)> {
        self.disable_foreign_key_constraints_when_migrating
            .then_some(("SET FOREIGN_KEY_CHECKS = 0", "SET FOREIGN_KEY_CHECKS = 1"))
    }
}

fn parse_major_minor(version: &str) -> (u32, u32) {
    let mut parts = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u32>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}
