//! FUSE filesystem implementation.

#[cfg(feature = "fuse")]
mod impl_fuse {
    use std::collections::HashMap;
    use std::ffi::OsStr;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, UNIX_EPOCH};

    use fuser::{
        FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
        ReplyEmpty, ReplyEntry, ReplyOpen, Request,
    };

    use crate::executor::AsyncExecutor;
    use crate::inode::INodeType;
    use crate::options::VfsOptions;
    use crate::view::{NodeAttributes, ObjectView, OpenFile};
    use crate::VfsError;

    struct OpenHandle {
        ino: u64,
        open: OpenFile,
    }

    /// Read-only FUSE filesystem serving one OCFL object version.
    pub struct OcflVfs {
        /// The immutable view all callbacks are answered from.
        view: Arc<ObjectView>,
        /// Runtime for backend I/O, separate from the FUSE session thread.
        executor: Arc<AsyncExecutor>,
        /// Open file handles.
        handles: HashMap<u64, OpenHandle>,
        /// Next file handle ID.
        next_handle: u64,
        /// VFS options.
        options: VfsOptions,
        uid: u32,
        gid: u32,
    }

    impl OcflVfs {
        /// Create a new VFS over an object view.
        ///
        /// # Arguments
        /// * `view` - View built by [`crate::open_object`]
        /// * `options` - VFS configuration options
        pub fn new(view: Arc<ObjectView>, options: VfsOptions) -> Result<Self, VfsError> {
            let executor = Arc::new(AsyncExecutor::new(options.executor.clone())?);
            Ok(Self {
                view,
                executor,
                handles: HashMap::new(),
                next_handle: 1,
                options,
                uid: unsafe { libc::getuid() },
                gid: unsafe { libc::getgid() },
            })
        }

        /// Name shown in the mount table.
        pub fn fs_name(&self) -> String {
            self.options
                .fs_name
                .clone()
                .unwrap_or_else(|| "ocfl".to_string())
        }

        /// Number of currently open file handles.
        pub fn open_handles(&self) -> usize {
            self.handles.len()
        }

        fn attr_ttl(&self) -> Duration {
            self.options.kernel_cache.attr_ttl()
        }

        fn entry_ttl(&self) -> Duration {
            self.options.kernel_cache.entry_ttl()
        }
    }

    fn file_type(kind: INodeType) -> FileType {
        match kind {
            INodeType::File => FileType::RegularFile,
            INodeType::Directory => FileType::Directory,
        }
    }

    /// Convert node attributes to FUSE file attributes.
    fn to_file_attr(attrs: &NodeAttributes, uid: u32, gid: u32) -> FileAttr {
        FileAttr {
            ino: attrs.id,
            size: attrs.size,
            blocks: (attrs.size + 511) / 512,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            kind: file_type(attrs.kind),
            perm: attrs.perm,
            nlink: attrs.nlink,
            uid,
            gid,
            rdev: 0,
            blksize: 512,
            flags: 0,
        }
    }

    /// Map a serving error to the errno reported to the kernel.
    fn errno(err: &VfsError) -> i32 {
        match err {
            VfsError::InodeNotFound(_) => libc::ENOENT,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::NotAFile(_) => libc::EISDIR,
            _ => libc::EIO,
        }
    }

    impl Filesystem for OcflVfs {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            let name: String = match name.to_str() {
                Some(n) => n.to_string(),
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
            };

            let view: Arc<ObjectView> = self.view.clone();
            let ttl: Duration = self.entry_ttl();
            let (uid, gid) = (self.uid, self.gid);
            let spawned = self.executor.spawn(async move {
                match view.lookup_attributes(parent, &name).await {
                    Ok(attrs) => reply.entry(&ttl, &to_file_attr(&attrs, uid, gid), 0),
                    Err(e) => reply.error(errno(&e)),
                }
            });
            // A dropped reply answers EIO.
            if let Err(e) = spawned {
                tracing::error!(parent, error = %e, "lookup not dispatched");
            }
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            let view: Arc<ObjectView> = self.view.clone();
            let ttl: Duration = self.attr_ttl();
            let (uid, gid) = (self.uid, self.gid);
            let spawned = self.executor.spawn(async move {
                match view.attributes(ino).await {
                    Ok(attrs) => reply.attr(&ttl, &to_file_attr(&attrs, uid, gid)),
                    Err(e) => reply.error(errno(&e)),
                }
            });
            if let Err(e) = spawned {
                tracing::error!(ino, error = %e, "getattr not dispatched");
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            let children = match self.view.children(ino) {
                Ok(c) => c,
                Err(e) => {
                    reply.error(errno(&e));
                    return;
                }
            };
            let parent: u64 = match self.view.parent(ino) {
                Ok(p) => p,
                Err(e) => {
                    reply.error(errno(&e));
                    return;
                }
            };

            let mut entries: Vec<(u64, FileType, String)> = vec![
                (ino, FileType::Directory, ".".to_string()),
                (parent, FileType::Directory, "..".to_string()),
            ];
            entries.extend(
                children
                    .into_iter()
                    .map(|entry| (entry.id, file_type(entry.kind), entry.name)),
            );

            let skip: usize = offset.max(0) as usize;
            for (i, (e_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
                if reply.add(*e_ino, (i + 1) as i64, *kind, name) {
                    break;
                }
            }
            reply.ok();
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            match self.view.inodes().inode_type(ino) {
                None => {
                    reply.error(libc::ENOENT);
                    return;
                }
                Some(INodeType::Directory) => {
                    reply.error(libc::EISDIR);
                    return;
                }
                Some(INodeType::File) => {}
            }

            if flags & libc::O_ACCMODE != libc::O_RDONLY {
                reply.error(libc::EROFS);
                return;
            }

            let view: Arc<ObjectView> = self.view.clone();
            let open: OpenFile = match self.executor.block_on(async move { view.open(ino).await }) {
                Ok(Ok(open)) => open,
                Ok(Err(e)) => {
                    tracing::warn!(ino, error = %e, "open failed");
                    reply.error(errno(&e));
                    return;
                }
                Err(e) => {
                    tracing::error!(ino, error = %e, "open not dispatched");
                    reply.error(libc::EIO);
                    return;
                }
            };

            let fh: u64 = self.next_handle;
            self.next_handle += 1;
            let open_flags: u32 = if open.keep_cache {
                fuser::consts::FOPEN_KEEP_CACHE
            } else {
                0
            };
            self.handles.insert(fh, OpenHandle { ino, open });
            reply.opened(fh, open_flags);
        }

        fn read(
            &mut self,
            _req: &Request,
            ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock: Option<u64>,
            reply: ReplyData,
        ) {
            let session = match self.handles.get(&fh) {
                Some(h) if h.ino == ino => h.open.session.clone(),
                _ => {
                    reply.error(libc::EBADF);
                    return;
                }
            };
            if offset < 0 {
                reply.error(libc::EINVAL);
                return;
            }

            let view: Arc<ObjectView> = self.view.clone();
            let spawned = self.executor.spawn(async move {
                match view.read(ino, session.as_ref(), offset as u64, size as u64).await {
                    Ok(data) => reply.data(&data),
                    Err(e) => reply.error(errno(&e)),
                }
            });
            if let Err(e) = spawned {
                tracing::error!(ino, fh, error = %e, "read not dispatched");
            }
        }

        fn release(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            _flags: i32,
            _lock: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            let handle: OpenHandle = match self.handles.remove(&fh) {
                Some(h) => h,
                None => {
                    reply.error(libc::EBADF);
                    return;
                }
            };
            match self.view.release(handle.open) {
                Ok(()) => reply.ok(),
                Err(e) => {
                    tracing::warn!(ino = handle.ino, fh, error = %e, "release failed");
                    reply.error(libc::EIO);
                }
            }
        }

        fn destroy(&mut self) {
            tracing::info!(open_handles = self.handles.len(), "filesystem unmounted");
            self.handles.clear();
            self.executor.shutdown();
        }
    }

    fn mount_options(fs_name: &str) -> Vec<MountOption> {
        vec![
            MountOption::RO,
            MountOption::FSName(fs_name.to_string()),
            MountOption::Subtype("ocfl".to_string()),
        ]
    }

    /// Mount a read-only VFS, blocking until it is unmounted.
    ///
    /// # Arguments
    /// * `vfs` - The VFS to mount
    /// * `mountpoint` - Path to mount at
    pub fn mount(vfs: OcflVfs, mountpoint: &Path) -> Result<(), VfsError> {
        let options: Vec<MountOption> = mount_options(&vfs.fs_name());
        fuser::mount2(vfs, mountpoint, &options)
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

    /// Spawn a read-only VFS mount in the background.
    ///
    /// # Arguments
    /// * `vfs` - The VFS to mount
    /// * `mountpoint` - Path to mount at
    ///
    /// # Returns
    /// Background session handle. Dropping it unmounts.
    pub fn spawn_mount(
        vfs: OcflVfs,
        mountpoint: &Path,
    ) -> Result<fuser::BackgroundSession, VfsError> {
        let options: Vec<MountOption> = mount_options(&vfs.fs_name());
        fuser::spawn_mount2(vfs, mountpoint, &options)
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

}

#[cfg(feature = "fuse")]
pub use impl_fuse::{mount, spawn_mount, OcflVfs};
