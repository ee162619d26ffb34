use crate::{Error, Result};
use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

/// Environment variable read by [`init_global_thread_pool`] when no explicit
/// thread count is given.
pub const THREADS_ENV_VAR: &str = "CV_RETRIEVAL_THREADS";

static THREAD_POOL_INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Initialize the global Rayon thread pool used for feature extraction and
/// query scoring.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `CV_RETRIEVAL_THREADS` environment variable
/// 3. Rayon default
///
/// Repeated calls return the outcome of the first one.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<()> {
    let res = THREAD_POOL_INIT.get_or_init(|| {
        let configured_threads = match num_threads {
            Some(n) => Some(n),
            None => read_threads_from_env()?,
        };

        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = configured_threads {
            if n == 0 {
                return Err(format!("{THREADS_ENV_VAR} must be >= 1"));
            }
            builder = builder.num_threads(n);
        }

        builder.build_global().map_err(|e| e.to_string())
    });
    res.clone().map_err(Error::ThreadPool)
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn read_threads_from_env() -> std::result::Result<Option<usize>, String> {
    let raw = match env::var(THREADS_ENV_VAR) {
        Ok(v) => v,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(format!("failed to read {THREADS_ENV_VAR}: {e}")),
    };

    parse_thread_count(&raw).map(Some)
}

fn parse_thread_count(raw: &str) -> std::result::Result<usize, String> {
    let parsed: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("{THREADS_ENV_VAR} must be a positive integer, got '{raw}'"))?;
    if parsed == 0 {
        return Err(format!("{THREADS_ENV_VAR} must be >= 1"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thread_counts() {
        assert_eq!(parse_thread_count("4"), Ok(4));
        assert_eq!(parse_thread_count(" 2 "), Ok(2));
        assert!(parse_thread_count("0").is_err());
        assert!(parse_thread_count("many").is_err());
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_global_thread_pool(None).is_ok();
        let second = init_global_thread_pool(Some(3)).is_ok();
        assert_eq!(first, second);
        assert!(current_cpu_threads() >= 1);
    }
}
