//! Executable page allocation (spec §4.5 step 3). Goes through the
//! `region` crate, which wraps the platform allocator (`mmap`+`mprotect`
//! on POSIX, `VirtualAlloc`+`VirtualProtect` on Windows) behind one
//! portable API granting `READ`/`WRITE`/`EXECUTE` independently. Pages are
//! written to while `READ_WRITE`, then flipped to `READ_EXECUTE` once code
//! generation finishes, so no page is ever both writable and executable.

use region::{protect, Allocation, Protection};

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page allocation failed: {0}")]
    Alloc(#[from] region::Error),
}

pub struct CodePage {
    alloc: Allocation,
    len: usize,
}

impl CodePage {
    pub fn alloc(len: usize) -> Result<CodePage, PageError> {
        let page_size = region::page::size();
        let rounded = ((len.max(1) + page_size - 1) / page_size) * page_size;
        let alloc = region::alloc(rounded, Protection::READ_WRITE)?;
        Ok(CodePage { alloc, len: rounded })
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        assert!(offset + bytes.len() <= self.len, "write past the end of the code page");
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.alloc.as_mut_ptr::<u8>().add(offset), bytes.len());
        }
    }

    /// Switches the page from `READ | WRITE` to `READ | EXECUTE`. After
    /// this call the page must not be written to again.
    pub fn make_executable(&mut self) -> Result<(), PageError> {
        unsafe { protect(self.alloc.as_ptr::<u8>(), self.len, Protection::READ_EXECUTE)? };
        Ok(())
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.alloc.as_ptr::<u8>()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
