//! On-disk layout of a persisted index: one directory per collection holding
//! `docstore.json`, `vector_store.json` and `index_store.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, LoadError};
use crate::index::{Node, VectorIndex};

pub(crate) const DOCSTORE_FILE: &str = "docstore.json";
pub(crate) const VECTOR_STORE_FILE: &str = "vector_store.json";
pub(crate) const INDEX_STORE_FILE: &str = "index_store.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DocStoreFile {
    nodes: Vec<Node>,
}

#[derive(Serialize, Deserialize)]
struct VectorStoreFile {
    embeddings: BTreeMap<String, Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct IndexStoreFile {
    format_version: u32,
    collection: String,
    embedding_model: String,
    dimension: usize,
    node_count: usize,
}

/// Write `index` under `dir`, replacing any previous files of the same name.
pub(crate) async fn persist(index: &VectorIndex, dir: &Path) -> Result<(), IndexError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| IndexError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let docstore = DocStoreFile {
        nodes: index.nodes.clone(),
    };
    let vector_store = VectorStoreFile {
        embeddings: index
            .nodes
            .iter()
            .zip(&index.embeddings)
            .map(|(node, vector)| (node.id.clone(), vector.clone()))
            .collect(),
    };
    let index_store = IndexStoreFile {
        format_version: FORMAT_VERSION,
        collection: index.collection.clone(),
        embedding_model: index.embedding_model.clone(),
        dimension: index.dimension,
        node_count: index.nodes.len(),
    };

    write_json(&dir.join(DOCSTORE_FILE), &docstore).await?;
    write_json(&dir.join(VECTOR_STORE_FILE), &vector_store).await?;
    // Written last: its presence marks a complete index.
    write_json(&dir.join(INDEX_STORE_FILE), &index_store).await?;
    Ok(())
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| IndexError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and validate the index persisted under `dir`.
pub(crate) async fn load(
    dir: &Path,
    collection: &str,
    embedding_model: &str,
) -> Result<VectorIndex, LoadError> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Err(LoadError::MissingDirectory(dir.to_path_buf()));
    }

    let index_store: IndexStoreFile = read_json(dir.join(INDEX_STORE_FILE)).await?;
    if index_store.format_version != FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion(index_store.format_version));
    }
    if index_store.collection != collection {
        return Err(LoadError::CollectionMismatch {
            expected: collection.to_owned(),
            found: index_store.collection,
        });
    }
    if index_store.embedding_model != embedding_model {
        return Err(LoadError::ModelMismatch {
            expected: embedding_model.to_owned(),
            found: index_store.embedding_model,
        });
    }

    let docstore: DocStoreFile = read_json(dir.join(DOCSTORE_FILE)).await?;
    let mut vector_store: VectorStoreFile = read_json(dir.join(VECTOR_STORE_FILE)).await?;

    if docstore.nodes.len() != index_store.node_count {
        return Err(LoadError::Inconsistent(format!(
            "index_store lists {} nodes, docstore has {}",
            index_store.node_count,
            docstore.nodes.len()
        )));
    }
    if vector_store.embeddings.len() != docstore.nodes.len() {
        return Err(LoadError::Inconsistent(format!(
            "vector_store has {} embeddings for {} nodes",
            vector_store.embeddings.len(),
            docstore.nodes.len()
        )));
    }

    let mut embeddings = Vec::with_capacity(docstore.nodes.len());
    for node in &docstore.nodes {
        let vector = vector_store.embeddings.remove(&node.id).ok_or_else(|| {
            LoadError::Inconsistent(format!("node {} has no embedding", node.id))
        })?;
        if vector.len() != index_store.dimension {
            return Err(LoadError::Inconsistent(format!(
                "node {} has dimension {}, expected {}",
                node.id,
                vector.len(),
                index_store.dimension
            )));
        }
        embeddings.push(vector);
    }

    Ok(VectorIndex {
        collection: index_store.collection,
        embedding_model: index_store.embedding_model,
        dimension: index_store.dimension,
        nodes: docstore.nodes,
        embeddings,
    })
}

async fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<T, LoadError> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::MissingFile(path));
        }
        Err(source) => return Err(LoadError::Io { path, source }),
    };
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Json { path, source })
}
