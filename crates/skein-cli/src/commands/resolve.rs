//! The `resolve` command: seed the cache, run the resolver, stream records,
//! persist the updated snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use skein_config::SkeinConfig;
use skein_graph::{
    CacheSnapshot, CacheStore, CancelToken, ChangeDetector, EmitFormat, ModuleId, NativeRuntime,
    RecordWriter, ResolveRequest, Resolver, TransformDescriptor, write_stream,
};

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::transforms::builtin_registry;

pub async fn resolve_execute(args: ResolveArgs, config: SkeinConfig) -> Result<(), CliError> {
    let entries = if args.entries.is_empty() {
        config.entries.clone()
    } else {
        args.entries.clone()
    };
    if entries.is_empty() {
        return Err(CliError::Usage(
            "no entry modules supplied (pass them as arguments or set `entries` in the config)"
                .to_string(),
        ));
    }

    let descriptors = if args.transforms.is_empty() {
        config.transforms.clone()
    } else {
        args.transforms
            .iter()
            .map(|raw| parse_transform_arg(raw))
            .collect::<Result<Vec<_>, _>>()?
    };
    let chain = builtin_registry().build_chain(&descriptors)?;

    let format = match args.format.as_deref().or(config.format.as_deref()) {
        Some(raw) => raw.parse::<EmitFormat>().map_err(CliError::Usage)?,
        None => EmitFormat::default(),
    };
    let workers = args
        .workers
        .or(config.workers)
        .unwrap_or_else(num_cpus::get);

    let runtime = Arc::new(NativeRuntime::new());

    // Seed the cache from the snapshot of the previous run, if any.
    let cache_path = args.cache.clone().or_else(|| config.cache.clone());
    let (cache, stored_hashes) = match &cache_path {
        Some(path) => load_snapshot(path).await?,
        None => (CacheStore::new(), FxHashMap::default()),
    };

    let mut changed = args.changed.clone();
    if args.detect_changes && !stored_hashes.is_empty() {
        let detector = ChangeDetector::from_hashes(stored_hashes);
        let set = detector.scan(runtime.as_ref()).await;
        tracing::info!(
            modified = set.modified.len(),
            removed = set.removed.len(),
            "change detection"
        );
        changed.extend(set.modified.iter().map(|id| id.as_path().to_path_buf()));
    }

    // Ctrl-C cancels the walk; already-finalized cache entries survive.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling resolution");
                cancel.cancel();
            }
        });
    }

    let request = ResolveRequest::new(entries)
        .with_changed(changed)
        .with_cache(cache.clone())
        .with_chain(chain)
        .with_workers(workers)
        .with_cancel(cancel);

    let stream = Resolver::new(Arc::clone(&runtime) as Arc<dyn skein_graph::Runtime>).resolve(request);

    let sink: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = RecordWriter::new(sink, format);

    let run_result = write_stream(stream, &mut writer).await;

    // Persist whatever the run committed, success or not: partial progress
    // is exactly what the next incremental run wants to start from.
    if let Some(path) = &cache_path {
        save_snapshot(path, &cache, runtime.as_ref()).await?;
    }

    match run_result {
        Ok(stats) => {
            tracing::info!(
                modules = stats.modules,
                cache_hits = stats.cache_hits,
                fresh = stats.fresh,
                "resolution complete"
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// `NAME` or `NAME=JSON` → descriptor.
fn parse_transform_arg(raw: &str) -> Result<TransformDescriptor, CliError> {
    match raw.split_once('=') {
        None => Ok(TransformDescriptor::new(raw)),
        Some((name, options)) => {
            let options = serde_json::from_str(options).map_err(|e| {
                CliError::Usage(format!("invalid options for --transform {name}: {e}"))
            })?;
            Ok(TransformDescriptor::new(name).with_options(options))
        }
    }
}

/// Read a snapshot file into a cache store plus its stored content hashes.
/// A missing file is a cold start, not an error.
async fn load_snapshot(
    path: &Path,
) -> Result<(CacheStore, FxHashMap<ModuleId, String>), CliError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no cache snapshot, starting cold");
            return Ok((CacheStore::new(), FxHashMap::default()));
        }
        Err(source) => {
            return Err(CliError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut snapshot = CacheSnapshot::from_json(&bytes).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    let hashes = std::mem::take(&mut snapshot.hashes);
    let store = CacheStore::from_snapshot(snapshot).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(modules = store.len(), path = %path.display(), "cache snapshot loaded");
    Ok((store, hashes))
}

/// Write the store back as a snapshot, atomically (temp file + rename).
async fn save_snapshot(
    path: &Path,
    cache: &CacheStore,
    runtime: &dyn skein_graph::Runtime,
) -> Result<(), CliError> {
    let io_err = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }

    let detector = ChangeDetector::from_store(cache, runtime).await;
    let snapshot = cache.to_snapshot(detector.module_hashes);
    let bytes = snapshot.to_json().map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;

    let temp = path.with_extension("tmp");
    tokio::fs::write(&temp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&temp, path).await.map_err(io_err)?;

    tracing::debug!(modules = cache.len(), path = %path.display(), "cache snapshot saved");
    Ok(())
}
