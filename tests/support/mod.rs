use std::sync::Mutex;

// Process-global env vars are shared across parallel tests; serialize access.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified, restoring the
/// previous values afterwards (also on unwind).
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Restore(Vec<(String, Option<String>)>);

    impl Drop for Restore {
        fn drop(&mut self) {
            for (key, value) in self.0.drain(..) {
                match value {
                    Some(v) => std::env::set_var(&key, v),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }

    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");

    let mut snapshot = Vec::new();
    for (key, value) in changes {
        if !snapshot.iter().any(|(k, _)| k == key) {
            snapshot.push((key.to_string(), std::env::var(key).ok()));
        }
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    let _restore = Restore(snapshot);

    f()
}
