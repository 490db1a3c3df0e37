//! Query execution seam.
//!
//! [`Executor`] is the boundary where a client library hands over a
//! [`ResultSet`]. The helpers here validate positional parameters, run the
//! query and decode the result; upstream failures abort before decoding.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cell::Cell;
use crate::convert::{collect_one_row, collect_rows, FromValue};
use crate::decode::decode;
use crate::error::{Error, Result};
use crate::result::ResultSet;
use crate::shape::{MatchMode, TargetShape};
use crate::value::Value;

/// Runs SQL with `$1, $2, ...` positional parameters.
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        sql: &str,
        params: &[Cell],
    ) -> impl Future<Output = Result<ResultSet>> + Send;
}

// ============================================================================
// Placeholders
// ============================================================================

/// Highest `$n` placeholder in `sql`, ignoring string literals, quoted
/// identifiers, dollar-quoted bodies and comments.
pub fn placeholder_count(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut max = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                let quote = bytes[i];
                let escapes = quote == b'\'' && is_escape_prefix(bytes, i);
                i += 1;
                // A doubled quote is an escaped quote; it reopens on the next pass.
                while i < bytes.len() && bytes[i] != quote {
                    i += if escapes && bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let mut depth = 1;
                i += 2;
                while i < bytes.len() && depth > 0 {
                    if bytes[i..].starts_with(b"/*") {
                        depth += 1;
                        i += 2;
                    } else if bytes[i..].starts_with(b"*/") {
                        depth -= 1;
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }
            b'$' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    let n = sql[start..end].parse().unwrap_or(0);
                    max = max.max(n);
                    i = end;
                    continue;
                }
                // Dollar quoting: $$...$$ or $tag$...$tag$
                while end < bytes.len() && is_ident_byte(bytes[end]) {
                    end += 1;
                }
                if bytes.get(end) == Some(&b'$') && !bytes[start].is_ascii_digit() {
                    let tag = &sql[i..=end];
                    match sql[end + 1..].find(tag) {
                        Some(close) => i = end + 1 + close + tag.len(),
                        None => i = bytes.len(),
                    }
                    continue;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    max
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `E'...'` escape string: the quote follows a standalone `E`/`e`.
fn is_escape_prefix(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1).map(|p| bytes[p]) {
        Some(b'E' | b'e') => quote < 2 || !is_ident_byte(bytes[quote - 2]),
        _ => false,
    }
}

/// Fail unless `params` fills exactly the placeholders `sql` uses.
pub fn check_params(sql: &str, params: &[Cell]) -> Result<()> {
    let expected = placeholder_count(sql);
    if expected != params.len() {
        warn!(expected, found = params.len(), "parameter count mismatch");
        return Err(Error::ParamCount {
            expected,
            found: params.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Query helpers
// ============================================================================

async fn run<E: Executor>(executor: &E, sql: &str, params: &[Cell]) -> Result<ResultSet> {
    check_params(sql, params)?;
    debug!(sql, params = params.len(), "executing query");
    let result = executor.execute(sql, params).await?;
    debug!(rows = result.len(), "query returned");
    Ok(result)
}

/// Execute and decode into an explicit target shape.
pub async fn fetch<E: Executor>(
    executor: &E,
    sql: &str,
    params: &[Cell],
    target: &TargetShape,
) -> Result<Value> {
    let result = run(executor, sql, params).await?;
    Ok(decode(&result, target)?)
}

/// Execute and decode every row into `T`.
pub async fn fetch_all<T: FromValue, E: Executor>(
    executor: &E,
    sql: &str,
    params: &[Cell],
    mode: MatchMode,
) -> Result<Vec<T>> {
    let result = run(executor, sql, params).await?;
    Ok(collect_rows(&result, mode)?)
}

/// Execute and decode the single row into `T`.
pub async fn fetch_one<T: FromValue, E: Executor>(
    executor: &E,
    sql: &str,
    params: &[Cell],
    mode: MatchMode,
) -> Result<T> {
    let result = run(executor, sql, params).await?;
    Ok(collect_one_row(&result, mode)?)
}

// ============================================================================
// In-memory executor
// ============================================================================

type Handler = Arc<dyn Fn(&[Cell]) -> Result<ResultSet> + Send + Sync>;

/// Executor answering registered SQL texts from memory.
///
/// Lookups ignore whitespace differences. Clones share the same registry.
#[derive(Clone, Default)]
pub struct MemoryExecutor {
    handlers: Arc<RwLock<HashMap<String, Handler>>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` by calling `handler` with the bound parameters.
    pub fn on<F>(&self, sql: &str, handler: F) -> &Self
    where
        F: Fn(&[Cell]) -> Result<ResultSet> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .insert(normalize_sql(sql), Arc::new(handler));
        self
    }

    /// Answer `sql` with a fixed result.
    pub fn on_result(&self, sql: &str, result: ResultSet) -> &Self {
        self.on(sql, move |_| Ok(result.clone()))
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl Executor for MemoryExecutor {
    async fn execute(&self, sql: &str, params: &[Cell]) -> Result<ResultSet> {
        let handler = self.handlers.read().get(&normalize_sql(sql)).cloned();
        match handler {
            Some(handler) => handler(params),
            None => Err(Error::Query(format!(
                "no result registered for query: {}",
                normalize_sql(sql)
            ))),
        }
    }
}

fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
