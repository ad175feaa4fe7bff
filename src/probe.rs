use std::cell::Cell;
use std::path::Path;

pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        let found = path.is_file();
        log::debug!("probe {} -> {found}", path.display());
        found
    }
}

#[derive(Debug, Default)]
pub struct CountingProbe<P = FsProbe> {
    inner: P,
    calls: Cell<usize>,
}

impl<P: FileProbe> CountingProbe<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<P: FileProbe> FileProbe for CountingProbe<P> {
    fn exists(&self, path: &Path) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.inner.exists(path)
    }
}

impl<T: FileProbe + ?Sized> FileProbe for &T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        p.push(format!(
            "class-autoload-probe-{}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis(),
            n
        ));
        p
    }

    #[test]
    fn fs_probe_accepts_files_only() {
        let dir = temp_dir();
        fs::create_dir_all(dir.join("App")).unwrap();
        fs::write(dir.join("App/User.php"), "<?php").unwrap();

        assert!(FsProbe.exists(&dir.join("App/User.php")));
        assert!(!FsProbe.exists(&dir.join("App")));
        assert!(!FsProbe.exists(&dir.join("App/Missing.php")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn counting_probe_counts_every_check() {
        let dir = temp_dir();
        let probe = CountingProbe::new(FsProbe);
        assert!(!probe.exists(&dir.join("a.php")));
        assert!(!probe.exists(&dir.join("b.php")));
        assert_eq!(probe.calls(), 2);
    }
}
