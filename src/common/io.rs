use std::fs::File;
use std::io::{self, Read};
#[cfg(unix)]
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::{Mmap, MmapOptions};

/// Holds file data: either a zero-copy mmap or an owned Vec.
/// Dereferences to `&[u8]` for transparent use.
pub enum FileData {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileData::Mmap(m) => m,
            FileData::Owned(v) => v,
        }
    }
}

/// Where the codec reads from.
///
/// Regular files are loaded whole so the buffer paths (and parallel encode)
/// apply; pipes, FIFOs, terminals and devices are streamed chunk by chunk.
pub enum Input {
    Data(FileData),
    Stream(Box<dyn Read>),
}

/// Files under 1MB are read(); larger ones are mapped.
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// After the first EPERM from O_NOATIME we stop asking for it.
#[cfg(target_os = "linux")]
static NOATIME_SUPPORTED: AtomicBool = AtomicBool::new(true);

/// Open a file with O_NOATIME on Linux to avoid atime inode writes.
#[cfg(target_os = "linux")]
fn open_noatime(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    if NOATIME_SUPPORTED.load(Ordering::Relaxed) {
        match std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOATIME)
            .open(path)
        {
            Ok(f) => return Ok(f),
            Err(ref e) if e.raw_os_error() == Some(libc::EPERM) => {
                // O_NOATIME requires file ownership or CAP_FOWNER
                NOATIME_SUPPORTED.store(false, Ordering::Relaxed);
            }
            Err(e) => return Err(e),
        }
    }
    File::open(path)
}

#[cfg(not(target_os = "linux"))]
fn open_noatime(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Open `filename` for encoding or decoding; `-` means standard input.
pub fn open_input(filename: &str) -> io::Result<Input> {
    if filename == "-" {
        return Ok(stdin_input());
    }

    let file = open_noatime(Path::new(filename))?;
    let metadata = file.metadata()?;
    // Zero-length regular files may still have content (procfs), so stream them.
    if metadata.file_type().is_file() && metadata.len() > 0 {
        return load_file(file, metadata.len()).map(Input::Data);
    }
    Ok(Input::Stream(Box::new(file)))
}

fn load_file(file: File, len: u64) -> io::Result<FileData> {
    if len < MMAP_THRESHOLD {
        let mut buf = vec![0u8; len as usize];
        let n = read_full(&mut &file, &mut buf)?;
        buf.truncate(n);
        return Ok(FileData::Owned(buf));
    }

    // SAFETY: read-only mapping; the file must not be truncated while mapped.
    match unsafe { MmapOptions::new().map(&file) } {
        Ok(mmap) => {
            advise_sequential(&mmap, len);
            Ok(FileData::Mmap(mmap))
        }
        Err(_) => {
            let mut buf = Vec::with_capacity(len as usize);
            let mut reader = file;
            reader.read_to_end(&mut buf)?;
            Ok(FileData::Owned(buf))
        }
    }
}

#[cfg(target_os = "linux")]
fn advise_sequential(mmap: &Mmap, len: u64) {
    if len >= 2 * 1024 * 1024 {
        let _ = mmap.advise(memmap2::Advice::HugePage);
    }
    let _ = mmap.advise(memmap2::Advice::Sequential);
    let _ = mmap.advise(memmap2::Advice::WillNeed);
}

#[cfg(not(target_os = "linux"))]
fn advise_sequential(_mmap: &Mmap, _len: u64) {}

fn stdin_input() -> Input {
    #[cfg(unix)]
    if let Some(mmap) = try_mmap_stdin() {
        return Input::Data(FileData::Mmap(mmap));
    }
    Input::Stream(Box::new(io::stdin().lock()))
}

/// Map stdin when it is redirected from a non-empty regular file (`< file`).
#[cfg(unix)]
fn try_mmap_stdin() -> Option<Mmap> {
    use std::os::unix::io::{AsRawFd, FromRawFd};

    let fd = io::stdin().as_raw_fd();
    // Borrow fd 0 without closing it on drop.
    let file = ManuallyDrop::new(unsafe { File::from_raw_fd(fd) });
    let metadata = file.metadata().ok()?;
    if !metadata.file_type().is_file() || metadata.len() == 0 {
        return None;
    }
    let mmap = unsafe { MmapOptions::new().map(&*file) }.ok()?;
    advise_sequential(&mmap, metadata.len());
    Some(mmap)
}

/// Read as many bytes as possible into buf, retrying on partial reads.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
