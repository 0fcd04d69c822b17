use super::TuneStore;
use crate::error::Result;
use crate::types::{ContentGroup, StoredTune, TuneDocument, TuneId, TuneRecord, UpsertOutcome};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct State {
    next_id: i64,
    documents: BTreeMap<TuneId, TuneDocument>,
}

impl State {
    fn allocate(&mut self) -> TuneId {
        self.next_id += 1;
        TuneId(self.next_id)
    }
}

/// In-memory store for tests and throwaway runs.
#[derive(Default)]
pub struct InMemoryTuneStore {
    state: Mutex<State>,
}

impl InMemoryTuneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw documents, identities assigned in order.
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = TuneDocument>,
    {
        let store = Self::new();
        {
            let mut state = store.lock();
            for document in documents {
                let id = state.allocate();
                state.documents.insert(id, document.normalized());
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TuneStore for InMemoryTuneStore {
    async fn upsert(&self, record: &TuneRecord) -> Result<UpsertOutcome> {
        let mut state = self.lock();
        let existing = state
            .documents
            .iter()
            .find(|(_, d)| d.source_url.as_deref() == Some(record.source_url.as_str()))
            .map(|(id, _)| *id);

        let document = TuneDocument::from(record);
        match existing {
            Some(id) => {
                state.documents.insert(id, document);
                debug!("Replaced tune {} ({})", id, record.source_url);
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                let id = state.allocate();
                state.documents.insert(id, document);
                debug!("Inserted tune {} ({})", id, record.source_url);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn scan(&self) -> Result<Vec<StoredTune>> {
        let state = self.lock();
        Ok(state
            .documents
            .iter()
            .map(|(id, document)| StoredTune {
                id: *id,
                document: document.clone(),
            })
            .collect())
    }

    async fn delete(&self, id: TuneId) -> Result<bool> {
        Ok(self.lock().documents.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[TuneId]) -> Result<usize> {
        let mut state = self.lock();
        Ok(ids.iter().filter(|id| state.documents.remove(*id).is_some()).count())
    }

    async fn group_by_content(&self) -> Result<Vec<ContentGroup>> {
        let state = self.lock();
        let mut groups: Vec<ContentGroup> = Vec::new();
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();

        for (id, document) in &state.documents {
            let Some(content) = document.content.as_deref() else {
                continue;
            };
            match index.get(content) {
                Some(&i) => groups[i].ids.push(*id),
                None => {
                    index.insert(content, groups.len());
                    groups.push(ContentGroup {
                        content: content.to_string(),
                        ids: vec![*id],
                    });
                }
            }
        }

        groups.retain(|g| g.count() > 1);
        Ok(groups)
    }

    async fn insert_document(&self, document: &TuneDocument) -> Result<TuneId> {
        let mut state = self.lock();
        let existing = document.source_url.as_deref().and_then(|url| {
            state
                .documents
                .iter()
                .find(|(_, d)| d.source_url.as_deref() == Some(url))
                .map(|(id, _)| *id)
        });
        let id = match existing {
            Some(id) => id,
            None => state.allocate(),
        };
        state.documents.insert(id, document.clone().normalized());
        Ok(id)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.lock().documents.len())
    }
}
