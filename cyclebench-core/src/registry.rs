//! Benchmark Registry
//!
//! An explicit, append-only list of `{name, callback}` pairs built before the
//! driver runs. Entries are stored by value in registration order; duplicate
//! names are kept as independent entries.

use crate::bencher::Bencher;
use thiserror::Error;

/// Boxed benchmark callback.
pub type BenchFn = Box<dyn FnMut(&mut Bencher)>;

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Entry submitted without a callback
    #[error("Failed to register benchmark: No benchmark passed (name `{name}`)")]
    MissingCallback {
        /// Name the entry was submitted under
        name: String,
    },
}

/// One registered benchmark.
pub struct BenchmarkDef {
    name: String,
    runner: BenchFn,
}

impl BenchmarkDef {
    /// Benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callback with `bencher`.
    pub fn run(&mut self, bencher: &mut Bencher) {
        (self.runner)(bencher)
    }
}

impl std::fmt::Debug for BenchmarkDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkDef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Benchmark submitted at link time through `inventory`.
///
/// The `cyclebench::register_bench!` macro builds these; a `None` runner is
/// rejected by [`Registry::discover`].
#[derive(Debug, Clone, Copy)]
pub struct StaticBenchmark {
    /// Benchmark name
    pub name: &'static str,
    /// Callback, if one was supplied
    pub runner_fn: Option<fn(&mut Bencher)>,
}

inventory::collect!(StaticBenchmark);

/// Ordered collection of benchmarks to run.
#[derive(Debug, Default)]
pub struct Registry {
    benchmarks: Vec<BenchmarkDef>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a benchmark.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(&mut Bencher) + 'static,
    {
        let name = name.into();
        tracing::debug!(bench = %name, index = self.benchmarks.len(), "registered benchmark");
        self.benchmarks.push(BenchmarkDef {
            name,
            runner: Box::new(f),
        });
        self
    }

    /// Append a benchmark whose callback may be missing.
    ///
    /// A missing callback is logged and nothing is stored.
    pub fn try_register<F>(&mut self, name: impl Into<String>, f: Option<F>) -> Result<(), RegistryError>
    where
        F: FnMut(&mut Bencher) + 'static,
    {
        let name = name.into();
        match f {
            Some(f) => {
                self.register(name, f);
                Ok(())
            }
            None => {
                let err = RegistryError::MissingCallback { name };
                tracing::error!("{err}");
                Err(err)
            }
        }
    }

    /// Build a registry from static entries, returning rejected ones alongside.
    pub fn from_static<'a, I>(entries: I) -> (Self, Vec<RegistryError>)
    where
        I: IntoIterator<Item = &'a StaticBenchmark>,
    {
        let mut registry = Self::new();
        let mut errors = Vec::new();
        for entry in entries {
            if let Err(e) = registry.try_register(entry.name, entry.runner_fn) {
                errors.push(e);
            }
        }
        (registry, errors)
    }

    /// Collect every benchmark submitted with `inventory`.
    ///
    /// Link order is not guaranteed; entries are sorted by name so runs are
    /// reproducible.
    pub fn discover() -> (Self, Vec<RegistryError>) {
        let mut entries: Vec<&StaticBenchmark> = inventory::iter::<StaticBenchmark>.into_iter().collect();
        entries.sort_by(|a, b| a.name.cmp(b.name));
        Self::from_static(entries)
    }

    /// Number of registered benchmarks
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.benchmarks.iter().map(BenchmarkDef::name)
    }

    /// Iterate mutably in registration order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BenchmarkDef> {
        self.benchmarks.iter_mut()
    }
}
