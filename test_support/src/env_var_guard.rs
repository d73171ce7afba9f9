//! Guards for temporarily modifying environment variables in tests.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. Every mutation happens while an [`EnvLock`] is
//! held and each guard restores the previous value on drop.
//!
//! ```rust,ignore
//! use test_support::ToolchainEnvGuard;
//!
//! // Holds the lock until dropped.
//! let _env = ToolchainEnvGuard::cleared().with("CC_target", "emcc");
//! ```

use std::borrow::Cow;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use shikumi_env::{
    CC_ENV, CC_HOST_ENV, CC_TARGET_ENV, CFLAGS_ENV, CROSSCOMPILE_ENV, CXX_ENV, CXX_HOST_ENV,
    CXX_TARGET_ENV, CXXFLAGS_ENV, NINJA_ENV,
};

/// Every variable toolchain detection and compdb queries consult.
pub const TOOLCHAIN_VARS: [&str; 10] = [
    CC_TARGET_ENV,
    CC_ENV,
    CFLAGS_ENV,
    CXX_TARGET_ENV,
    CXX_ENV,
    CXXFLAGS_ENV,
    CC_HOST_ENV,
    CXX_HOST_ENV,
    CROSSCOMPILE_ENV,
    NINJA_ENV,
];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive right to mutate the process environment.
#[derive(Debug)]
pub struct EnvLock {
    _guard: MutexGuard<'static, ()>,
}

impl EnvLock {
    /// Block until no other test holds the lock.
    ///
    /// A holder that panicked leaves the environment restored by its guards,
    /// so poisoning is ignored.
    pub fn acquire() -> Self {
        Self {
            _guard: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// RAII guard that resets one environment variable to its previous value.
#[derive(Debug)]
pub struct EnvVarGuard {
    name: Cow<'static, str>,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    /// Set `name` to `val`, returning a guard that restores the prior value.
    ///
    /// Callers must hold an [`EnvLock`].
    #[must_use]
    pub fn set(name: impl Into<Cow<'static, str>>, val: &str) -> Self {
        let name = name.into();
        let prev = std::env::var_os(&*name);
        // SAFETY: `EnvLock` serialises mutations of the process environment.
        unsafe { std::env::set_var(&*name, val) };
        Self { name, prev }
    }

    /// Remove `name`, returning a guard that restores the prior value.
    ///
    /// Callers must hold an [`EnvLock`].
    #[must_use]
    pub fn remove(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let prev = std::env::var_os(&*name);
        // SAFETY: `EnvLock` serialises mutations of the process environment.
        unsafe { std::env::remove_var(&*name) };
        Self { name, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: `EnvLock` is still held while the prior value is restored.
        unsafe {
            match &self.prev {
                Some(value) => std::env::set_var(&*self.name, value),
                None => std::env::remove_var(&*self.name),
            }
        }
    }
}

/// Takes the [`EnvLock`], clears [`TOOLCHAIN_VARS`] and applies overrides.
///
/// Variables are restored in reverse order before the lock is released.
#[derive(Debug)]
pub struct ToolchainEnvGuard {
    guards: Vec<EnvVarGuard>,
    _lock: EnvLock,
}

impl ToolchainEnvGuard {
    /// Acquire the lock and remove every toolchain variable.
    ///
    /// Do not call while already holding an [`EnvLock`]; the lock is not
    /// reentrant.
    #[must_use]
    pub fn cleared() -> Self {
        let lock = EnvLock::acquire();
        Self {
            guards: TOOLCHAIN_VARS.into_iter().map(EnvVarGuard::remove).collect(),
            _lock: lock,
        }
    }

    /// Additionally set `name` to `val`.
    #[must_use]
    pub fn with(mut self, name: &'static str, val: &str) -> Self {
        self.guards.push(EnvVarGuard::set(name, val));
        self
    }
}

impl Drop for ToolchainEnvGuard {
    fn drop(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}
