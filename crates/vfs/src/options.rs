//! Configuration for serving an object view.

use std::time::Duration;

use crate::executor::ExecutorConfig;

/// How long the kernel may cache attributes and directory entries.
///
/// The view never changes while mounted, so long timeouts are safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelCacheOptions {
    /// Attribute cache timeout in seconds.
    pub attr_timeout_secs: u64,
    /// Directory entry cache timeout in seconds.
    pub entry_timeout_secs: u64,
}

impl Default for KernelCacheOptions {
    fn default() -> Self {
        Self {
            attr_timeout_secs: 3600,
            entry_timeout_secs: 3600,
        }
    }
}

impl KernelCacheOptions {
    pub fn attr_ttl(&self) -> Duration {
        Duration::from_secs(self.attr_timeout_secs)
    }

    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_timeout_secs)
    }
}

/// Options for mounting an object view.
#[derive(Debug, Clone, Default)]
pub struct VfsOptions {
    /// Kernel attribute and entry caching.
    pub kernel_cache: KernelCacheOptions,
    /// Async executor used by FUSE callbacks.
    pub executor: ExecutorConfig,
    /// Filesystem name shown in the mount table (default: `ocfl-<object>`).
    pub fs_name: Option<String>,
}

impl VfsOptions {
    /// Set the kernel cache options.
    pub fn with_kernel_cache(mut self, kernel_cache: KernelCacheOptions) -> Self {
        self.kernel_cache = kernel_cache;
        self
    }

    /// Set the executor configuration.
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Set the filesystem name.
    pub fn with_fs_name(mut self, fs_name: impl Into<String>) -> Self {
        self.fs_name = Some(fs_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VfsOptions::default();
        assert_eq!(options.kernel_cache.attr_ttl(), Duration::from_secs(3600));
        assert_eq!(options.executor.worker_threads, 4);
        assert!(options.fs_name.is_none());
    }

    #[test]
    fn test_builders() {
        let options = VfsOptions::default()
            .with_kernel_cache(KernelCacheOptions {
                attr_timeout_secs: 1,
                entry_timeout_secs: 2,
            })
            .with_executor(ExecutorConfig::default().with_worker_threads(8))
            .with_fs_name("ocfl-test");
        assert_eq!(options.kernel_cache.entry_ttl(), Duration::from_secs(2));
        assert_eq!(options.executor.worker_threads, 8);
        assert_eq!(options.fs_name.as_deref(), Some("ocfl-test"));
    }
}
