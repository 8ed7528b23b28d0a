//! Модуль для работы с временными файлами
//!
//! Каждая операция получает свою сессию: имена файлов строятся как
//! `{role}_{session_id}.{ext}` внутри общего корня, поэтому параллельные
//! операции не пересекаются и блокировки не нужны.

use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Менеджер временных файлов
#[derive(Debug, Clone)]
pub struct TempFileManager {
    /// Корневая временная директория
    root: PathBuf,
    /// Нужно ли удалять файлы при завершении
    cleanup: bool,
}

impl TempFileManager {
    /// Создать менеджер и убедиться, что корень существует
    pub fn new(root: impl Into<PathBuf>, cleanup: bool) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Temp root ready at {}", root.display());

        Ok(Self { root, cleanup })
    }

    /// Повторно создать корень, если его удалили извне
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Детерминированный путь для роли в сессии
    pub fn allocate(&self, session_id: &str, role: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}_{}.{}", role, session_id, extension))
    }

    /// Открыть новую сессию со свежим идентификатором
    pub fn session(&self) -> TempSession {
        TempSession {
            id: uuid::Uuid::new_v4().simple().to_string(),
            manager: self.clone(),
            files: Vec::new(),
        }
    }

    /// Удалить файлы. Ошибка по одному файлу не останавливает удаление остальных
    pub async fn cleanup<P: AsRef<Path>>(&self, paths: &[P]) {
        if !self.cleanup {
            debug!("Temp cleanup disabled, keeping {} file(s)", paths.len());
            return;
        }

        for path in paths {
            let path = path.as_ref();
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!("Removed temp file {}", path.display()),
                // файл мог так и не появиться, если операция упала раньше
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove temp file {}: {}", path.display(), e),
            }
        }
    }

    /// Удалить все файлы сессии
    pub async fn cleanup_session(&self, session: &mut TempSession) {
        let files = std::mem::take(&mut session.files);
        self.cleanup(&files).await;
    }
}

/// Набор временных файлов одной операции
#[derive(Debug)]
pub struct TempSession {
    id: String,
    manager: TempFileManager,
    files: Vec<PathBuf>,
}

impl TempSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Выделить путь под роль и запомнить его для очистки
    pub fn allocate(&mut self, role: &str, extension: &str) -> PathBuf {
        let path = self.manager.allocate(&self.id, role, extension);
        self.files.push(path.clone());
        path
    }

    /// Пути, выделенные в этой сессии и еще не очищенные
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Drop for TempSession {
    fn drop(&mut self) {
        // сюда попадаем без явной очистки, например при отмене future
        if self.manager.cleanup {
            for file in &self.files {
                let _ = fs::remove_file(file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_is_deterministic_and_namespaced() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), true).unwrap();

        let path = manager.allocate("abc123", "voice", "wav");
        assert_eq!(path, dir.path().join("voice_abc123.wav"));
        assert_eq!(path, manager.allocate("abc123", "voice", "wav"));
        assert_ne!(path, manager.allocate("def456", "voice", "wav"));
    }

    #[test]
    fn new_creates_missing_root_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("asmr");

        TempFileManager::new(&root, true).unwrap();
        assert!(root.is_dir());
        TempFileManager::new(&root, true).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), true).unwrap();
        let a = manager.session();
        let b = manager.session();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn cleanup_removes_files_and_tolerates_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), true).unwrap();
        let mut session = manager.session();

        let written = session.allocate("input", "wav");
        let never_written = session.allocate("output", "wav");
        tokio::fs::write(&written, b"RIFF").await.unwrap();

        manager.cleanup_session(&mut session).await;

        assert!(!written.exists());
        assert!(!never_written.exists());
        assert!(session.paths().is_empty());
    }

    #[tokio::test]
    async fn cleanup_continues_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), true).unwrap();

        // каталог вместо файла: remove_file вернет ошибку
        let blocker = dir.path().join("blocker_dir");
        tokio::fs::create_dir(&blocker).await.unwrap();
        let regular = dir.path().join("regular.wav");
        tokio::fs::write(&regular, b"data").await.unwrap();

        manager.cleanup(&[blocker.clone(), regular.clone()]).await;

        assert!(blocker.exists());
        assert!(!regular.exists());
    }

    #[tokio::test]
    async fn disabled_cleanup_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), false).unwrap();
        let mut session = manager.session();
        let path = session.allocate("output", "wav");
        tokio::fs::write(&path, b"data").await.unwrap();

        manager.cleanup_session(&mut session).await;
        drop(session);

        assert!(path.exists());
    }

    #[test]
    fn dropped_session_removes_its_files() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempFileManager::new(dir.path(), true).unwrap();
        let path = {
            let mut session = manager.session();
            let path = session.allocate("orphan", "wav");
            std::fs::write(&path, b"data").unwrap();
            path
        };
        assert!(!path.exists());
    }
}
