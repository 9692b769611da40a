//! Name sets used to classify imports and recognise database calls
//!
//! Built once from the built-in lists plus any `[imports]` / `[side_effects]`
//! extensions, then shared read-only by every analyzer.

use super::EngineConfig;
use std::collections::HashSet;

const STDLIB_MODULES: &[&str] = &[
    "datetime",
    "time",
    "json",
    "os",
    "sys",
    "logging",
    "re",
    "pathlib",
    "collections",
    "itertools",
    "functools",
    "typing",
    "abc",
    "copy",
    "contextlib",
    "warnings",
    "tempfile",
    "shutil",
    "random",
    "uuid",
    "hashlib",
    "base64",
    "urllib",
    "http",
    "email",
    "xml",
    "html",
    "csv",
    "sqlite3",
    "pickle",
    "gzip",
    "zipfile",
    "tarfile",
    "configparser",
];

/// The orchestration engine's own namespace and its vendor
const TRUSTED_MODULES: &[&str] = &["airflow", "astronomer"];

/// Fully qualified import names that mean the DAG talks to a database directly
const DB_ACCESS_MODULES: &[&str] = &[
    "sqlalchemy",
    "sqlalchemy.orm",
    "sqlalchemy.sql",
    "sqlalchemy.engine",
    "sqlalchemy.ext",
    "sqlalchemy.dialects",
    "sqlalchemy.pool",
    "sqlalchemy.func",
    "func",
    "orm",
    "Session",
    "sqlalchemy.orm.session",
    "sqlalchemy.orm.query",
    "sqlalchemy.sql.expression",
    "sqlalchemy.engine.create",
    "pymysql",
    "psycopg2",
    "mysql.connector",
    "airflow.utils.db",
    "airflow.utils.db_cleanup",
    "airflow.utils.session",
    "airflow.utils.sqlalchemy",
    "provide_session",
    "NEW_SESSION",
];

/// Session/engine/query lifecycle calls, matched on bare-name calls
const DB_METHODS: &[&str] = &[
    "execute",
    "query",
    "commit",
    "rollback",
    "close",
    "connect",
    "create_engine",
    "sessionmaker",
    "scoped_session",
    "min",
    "max",
    "scalar",
    "all",
    "first",
    "one",
    "count",
    "select_from",
];

/// ORM classes, matched on bare-name calls (`Session()`, `MetaData()`)
const DB_CLASSES: &[&str] = &[
    "Engine",
    "Connection",
    "Session",
    "Query",
    "MetaData",
    "Table",
];

/// Receivers whose attribute calls are treated as database operations
const DB_MODULES: &[&str] = &["sqlalchemy", "orm", "engine", "session", "query", "func"];

/// Migration and reset utilities, matched as bare names or attributes
const DB_FUNCTIONS: &[&str] = &[
    "run_cleanup",
    "purge_table",
    "resetdb",
    "initdb",
    "upgradedb",
    "check_migrations",
    "reflect_tables",
    "provide_session",
    "NEW_SESSION",
];

fn build_set(builtin: &[&str], extra: &[String]) -> HashSet<String> {
    builtin
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

/// Immutable classification configuration, passed by reference into analyzers
#[derive(Debug, Clone)]
pub struct ClassificationSets {
    pub stdlib: HashSet<String>,
    pub trusted: HashSet<String>,
    pub db_access: HashSet<String>,
    pub db_methods: HashSet<String>,
    pub db_classes: HashSet<String>,
    pub db_modules: HashSet<String>,
    pub db_functions: HashSet<String>,
}

impl Default for ClassificationSets {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ClassificationSets {
    pub fn from_config(config: &EngineConfig) -> Self {
        let imports = &config.imports;
        let side_effects = &config.side_effects;
        Self {
            stdlib: build_set(STDLIB_MODULES, &imports.extra_stdlib),
            trusted: build_set(TRUSTED_MODULES, &imports.extra_trusted),
            db_access: build_set(DB_ACCESS_MODULES, &imports.extra_db_access),
            db_methods: build_set(DB_METHODS, &side_effects.extra_methods),
            db_classes: build_set(DB_CLASSES, &[]),
            db_modules: build_set(DB_MODULES, &side_effects.extra_modules),
            db_functions: build_set(DB_FUNCTIONS, &side_effects.extra_db_functions),
        }
    }

    /// True if a bare-name call `name(...)` looks like a database operation
    pub fn is_db_call_name(&self, name: &str) -> bool {
        self.db_methods.contains(name)
            || self.db_classes.contains(name)
            || self.db_functions.contains(name)
    }

    /// True if `receiver.attr(...)` looks like a database operation
    pub fn is_db_attribute_call(&self, receiver: &str, attr: &str) -> bool {
        self.db_modules.contains(receiver) || self.db_functions.contains(attr)
    }
}
