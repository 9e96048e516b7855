pub mod action;
pub mod catalog;
pub mod chain;
pub mod config;
pub mod fields;
pub mod init;
pub mod kinds;
pub mod single;
pub mod transfer;
pub mod when;

use anyhow::Context;
use cueboard_core::{
    config::Config,
    notice::{Notice, NoticeLevel},
    resolver::{Catalog, CatalogResolver, Watched},
    session::EditorSession,
    store::ActionDb,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type Resolver = Arc<Watched<CatalogResolver>>;
pub type Session = EditorSession<Arc<ActionDb>, Resolver>;

/// Everything a command needs from an initialized project.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub db: Arc<ActionDb>,
    pub catalog: Catalog,
}

impl Project {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let store_path = config.store_path(root);
        let db = ActionDb::open(&store_path)
            .with_context(|| format!("failed to open {}", store_path.display()))?;
        let catalog_path = config.catalog_path(root);
        let catalog = Catalog::load(&catalog_path)
            .with_context(|| format!("failed to load {}", catalog_path.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            db: Arc::new(db),
            catalog,
        })
    }

    /// An editing session over this project's store. Slow lookups post
    /// advisories that come back out of [`Session::drain_notices`].
    pub fn session(&self) -> Session {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let resolver = CatalogResolver::new(self.catalog.clone(), self.config.plugins.enabled());
        let watched = Watched::new(resolver, self.config.advisory_after(), tx);
        EditorSession::new(self.db.clone(), Arc::new(watched)).with_advisories(rx)
    }
}

/// Run one async command body to completion.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(rt.block_on(fut))
}

/// Print what the session reported. Info goes to stdout unless the command
/// is producing JSON; everything else goes to stderr.
pub fn print_notices(notices: &[Notice], json: bool) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info if json => {}
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Advisory | NoticeLevel::Error => eprintln!("{notice}"),
        }
    }
}
