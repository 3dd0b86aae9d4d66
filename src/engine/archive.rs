//! Архив слоёв целиком: атомарная запись, устойчивое к повреждениям чтение
//! и применение прочитанных записей к живым слоям.

use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use mlsaver_error::{CodecError, IoError, IoOp, MlResult, ResultExt, StackError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{
    mldata::{read_frame, write_record, ArchiveHeader, LayerRecord},
    reconcile::{reconcile, Reconciliation},
};
use crate::host::LayerRef;

/// Итог успешной записи архива.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub layers: usize,
    pub features: usize,
    pub bytes: u64,
}

/// Сериализует набор слоёв в один архив.
///
/// Весь архив собирается в памяти до открытия файла: ошибка кодирования
/// любого слоя оставляет прежний файл нетронутым.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveWriter {
    compress: bool,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Включает zstd-сжатие полезной нагрузки записей.
    pub fn compressed(
        mut self,
        on: bool,
    ) -> Self {
        self.compress = on;
        self
    }

    /// Снимки слоёв в порядке перечисления. Повтор идентификатора слоя
    /// является ошибкой.
    pub fn snapshot(layers: &[LayerRef]) -> MlResult<Vec<LayerRecord>> {
        let mut seen = HashSet::with_capacity(layers.len());
        let mut records = Vec::with_capacity(layers.len());
        for layer in layers {
            let record = LayerRecord::snapshot(&*layer.borrow());
            if !seen.insert(record.id.clone()) {
                return Err(CodecError::DuplicateLayer { id: record.id }.into());
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Кодирует готовые снимки в байты архива.
    pub fn encode_records(
        &self,
        records: &[LayerRecord],
    ) -> MlResult<Vec<u8>> {
        let count = u32::try_from(records.len()).map_err(|_| CodecError::SizeLimit {
            what: "layer count".to_string(),
            size: records.len() as u64,
            limit: u64::from(u32::MAX),
        })?;

        let mut buf = Vec::new();
        ArchiveHeader::new(count, self.compress).write_to(&mut buf)?;
        for record in records {
            write_record(&mut buf, record, self.compress)?;
        }
        Ok(buf)
    }

    /// Кодирует живые слои в байты архива.
    pub fn encode(
        &self,
        layers: &[LayerRef],
    ) -> MlResult<Vec<u8>> {
        self.encode_records(&Self::snapshot(layers)?)
    }

    /// Записывает архив в `path`, заменяя прежний файл атомарно.
    pub fn write(
        &self,
        layers: &[LayerRef],
        path: &Path,
    ) -> MlResult<WriteSummary> {
        let records = Self::snapshot(layers)?;
        let bytes = self
            .encode_records(&records)
            .with_context(|| format!("archive {}", path.display()))?;
        persist_atomically(path, &bytes)?;

        let summary = WriteSummary {
            path: path.to_path_buf(),
            layers: records.len(),
            features: records.iter().map(LayerRecord::feature_count).sum(),
            bytes: bytes.len() as u64,
        };
        info!(
            path = %path.display(),
            records = summary.layers,
            features = summary.features,
            bytes = summary.bytes,
            "Archive written"
        );
        Ok(summary)
    }
}

/// Пишет байты во временный файл рядом с целью и переименовывает его.
fn persist_atomically(
    path: &Path,
    bytes: &[u8],
) -> MlResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| IoError::new(IoOp::Write, path, &e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.as_file_mut().sync_all())
        .map_err(|e| IoError::new(IoOp::Write, path, &e))?;
    tmp.persist(path)
        .map_err(|e| IoError::new(IoOp::Persist, path, &e.error))?;
    Ok(())
}

/// Одна запись прочитанного архива.
#[derive(Debug, Clone)]
pub enum ArchiveEntry {
    /// Запись прочитана и проверена.
    Record(LayerRecord),
    /// Запись не прочитана. `id` известен, если уцелела рамка записи.
    Corrupt {
        id: Option<String>,
        error: StackError,
    },
}

impl ArchiveEntry {
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            Self::Record(r) => Some(&r.id),
            Self::Corrupt { id, .. } => id.as_deref(),
        }
    }
}

/// Прочитанный архив.
#[derive(Debug, Clone)]
pub struct Archive {
    pub header: ArchiveHeader,
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn records(&self) -> impl Iterator<Item = &LayerRecord> {
        self.entries.iter().filter_map(|e| match e {
            ArchiveEntry::Record(r) => Some(r),
            ArchiveEntry::Corrupt { .. } => None,
        })
    }

    pub fn record(
        &self,
        id: &str,
    ) -> Option<&LayerRecord> {
        self.records().find(|r| r.id == id)
    }

    pub fn corrupt_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ArchiveEntry::Corrupt { .. }))
            .count()
    }
}

/// Читает архив слоёв.
pub struct ArchiveReader;

impl ArchiveReader {
    /// Читает файл архива.
    ///
    /// Ошибкой завершается только невозможность открыть файл или разобрать
    /// заголовок. Повреждённые записи попадают в архив как
    /// [`ArchiveEntry::Corrupt`].
    pub fn read(path: &Path) -> MlResult<Archive> {
        let bytes = fs::read(path).map_err(|e| IoError::new(IoOp::Read, path, &e))?;
        Self::decode(&bytes).with_context(|| format!("archive {}", path.display()))
    }

    /// Разбирает байты архива.
    pub fn decode(bytes: &[u8]) -> MlResult<Archive> {
        let mut r = bytes;
        let header = ArchiveHeader::read_from(&mut r)?;
        let compressed = header.is_compressed();

        let mut entries = Vec::with_capacity((header.record_count as usize).min(1024));
        let mut seen = HashSet::new();
        for index in 0..header.record_count {
            let raw = match read_frame(&mut r) {
                Ok(raw) => raw,
                Err(e) => {
                    // граница следующей записи неизвестна
                    let error = e.context(format!("record {index} of {}", header.record_count));
                    warn!(records = index, error = %error, "Stopping archive scan");
                    entries.push(ArchiveEntry::Corrupt { id: None, error });
                    break;
                }
            };

            let id = raw.id.clone();
            if !seen.insert(id.clone()) {
                warn!(layer = %id, "Skipping duplicate layer record");
                entries.push(ArchiveEntry::Corrupt {
                    id: Some(id.clone()),
                    error: CodecError::DuplicateLayer { id }.into(),
                });
                continue;
            }

            match raw.decode(compressed) {
                Ok(record) => {
                    debug!(
                        layer = %record.id,
                        features = record.feature_count(),
                        "Decoded layer record"
                    );
                    entries.push(ArchiveEntry::Record(record));
                }
                Err(error) => {
                    warn!(layer = %id, error = %error, "Skipping corrupt layer record");
                    entries.push(ArchiveEntry::Corrupt {
                        id: Some(id),
                        error,
                    });
                }
            }
        }

        if !r.is_empty() && entries.len() == header.record_count as usize {
            warn!(bytes = r.len(), "Ignoring trailing bytes after last record");
        }

        Ok(Archive { header, entries })
    }
}

/// Результат применения одной записи архива.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// Объекты записи заменили объекты живого слоя.
    Applied {
        id: String,
        features: usize,
        reconciliation: Reconciliation,
    },
    /// В проекте нет слоя с таким идентификатором.
    Ignored { id: String },
    /// Запись не применена: повреждена, несовместима или отвергнута хостом.
    Warning {
        id: Option<String>,
        error: StackError,
    },
}

impl RecordOutcome {
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            Self::Applied { id, .. } | Self::Ignored { id } => Some(id),
            Self::Warning { id, .. } => id.as_deref(),
        }
    }
}

/// Итог применения архива к проекту.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Applied { .. }))
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (Option<&str>, &StackError)> {
        self.outcomes.iter().filter_map(|o| match o {
            RecordOutcome::Warning { id, error } => Some((id.as_deref(), error)),
            _ => None,
        })
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Текст предупреждения для пользователя: по строке на запись.
    pub fn warning_message(&self) -> Option<String> {
        let lines: Vec<String> = self
            .warnings()
            .map(|(id, error)| match id {
                Some(id) => format!("Layer {id}: {error}"),
                None => format!("Unreadable record: {error}"),
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Заменяет объекты живых слоёв объектами из архива.
///
/// Записи сопоставляются со слоями по идентификатору. Каждая запись
/// применяется независимо: сбой одной даёт [`RecordOutcome::Warning`] и не
/// мешает остальным. Живые слои без записи не трогаются.
pub fn apply(
    archive: &Archive,
    layers: &[LayerRef],
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for entry in &archive.entries {
        let outcome = match entry {
            ArchiveEntry::Corrupt { id, error } => RecordOutcome::Warning {
                id: id.clone(),
                error: error.clone(),
            },
            ArchiveEntry::Record(record) => apply_record(record, layers),
        };
        report.outcomes.push(outcome);
    }
    report
}

fn apply_record(
    record: &LayerRecord,
    layers: &[LayerRef],
) -> RecordOutcome {
    let Some(layer) = layers.iter().find(|l| l.borrow().id() == record.id) else {
        debug!(layer = %record.id, "No live layer for archived record");
        return RecordOutcome::Ignored {
            id: record.id.clone(),
        };
    };

    let reconciled = {
        let live = layer.borrow();
        reconcile(record, live.geometry_kind(), &live.schema())
    };
    let (features, reconciliation) = match reconciled {
        Ok(ok) => ok,
        Err(e) => {
            warn!(layer = %record.id, error = %e, "Layer not restored");
            return RecordOutcome::Warning {
                id: Some(record.id.clone()),
                error: e.into(),
            };
        }
    };
    if !reconciliation.is_exact() {
        warn!(
            layer = %record.id,
            dropped = ?reconciliation.dropped,
            missing = ?reconciliation.missing,
            retyped = ?reconciliation.retyped,
            "Archived schema differs from live layer"
        );
    }

    let count = features.len();
    if let Err(e) = layer.borrow_mut().replace_features(features) {
        warn!(layer = %record.id, error = %e, "Layer rejected restored features");
        return RecordOutcome::Warning {
            id: Some(record.id.clone()),
            error: e.into(),
        };
    }

    debug!(layer = %record.id, features = count, "Layer restored");
    RecordOutcome::Applied {
        id: record.id.clone(),
        features: count,
        reconciliation,
    }
}
