//! The loaded document: object resolution, the lazy page tree and the font cache.

use super::filters;
use super::object::{dict_name, Dictionary, Object, ObjectId, ObjectParser, Stream};
use super::options::ParseOptions;
use super::xref::{self, Xref, XrefEntry};
use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};
use crate::font::{Font, FontCache, FontKey};
use crate::model::Metadata;
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Reference chains longer than this are treated as broken.
const MAX_REFERENCE_HOPS: usize = 32;
/// Page tree nesting limit.
const MAX_TREE_DEPTH: usize = 64;

/// A resolved object: either borrowed from the caller or shared from the object cache.
#[derive(Debug)]
pub enum Resolved<'a> {
    Direct(&'a Object),
    Indirect(Arc<Object>),
}

impl Deref for Resolved<'_> {
    type Target = Object;

    fn deref(&self) -> &Object {
        match self {
            Resolved::Direct(obj) => obj,
            Resolved::Indirect(obj) => obj,
        }
    }
}

/// A leaf of the page tree with its inherited attributes applied.
#[derive(Debug, Clone)]
pub struct PageNode {
    /// 1-based page number.
    pub number: u32,
    /// Object id of the page dictionary, when it is an indirect object.
    pub id: Option<ObjectId>,
    pub dict: Dictionary,
    /// Effective `/Resources`, possibly inherited from an ancestor.
    pub resources: Dictionary,
    /// Object owning the resources, used to key inline fonts.
    pub resources_owner: Option<ObjectId>,
    /// Effective `/MediaBox`, normalized to `[x0 y0 x1 y1]` with `x0 <= x1`
    /// and `y0 <= y1`.
    pub media_box: Option<[f64; 4]>,
}

/// Attributes a page inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    resources: Option<(Object, Option<ObjectId>)>,
    media_box: Option<Object>,
}

impl Inherited {
    fn apply(&mut self, dict: &Dictionary, id: Option<ObjectId>) {
        if let Some(resources) = dict.get("Resources") {
            let owner = resources.as_reference().or(id);
            self.resources = Some((resources.clone(), owner));
        }
        if let Some(media_box) = dict.get("MediaBox") {
            self.media_box = Some(media_box.clone());
        }
    }
}

/// Decoded contents of an object stream.
struct ObjectStream {
    data: Vec<u8>,
    /// (object number, absolute offset into `data`)
    entries: Vec<(u32, usize)>,
}

/// A parsed PDF document.
///
/// Construction validates the header, the cross-reference structure, the
/// catalog and the root of the page tree. Individual pages, fonts and other
/// objects are parsed on first access and cached for the document's lifetime.
/// All caches are safe to populate from several threads.
pub struct Document {
    data: Vec<u8>,
    format: PdfFormat,
    xref: Xref,
    catalog: Dictionary,
    page_root: (Dictionary, Option<ObjectId>),
    page_count: u32,
    pages: Vec<OnceLock<Arc<PageNode>>>,
    all_pages: OnceLock<Vec<Arc<PageNode>>>,
    objects: RwLock<HashMap<u32, Arc<Object>>>,
    object_streams: RwLock<HashMap<u32, Arc<ObjectStream>>>,
    fonts: FontCache,
    encrypted: bool,
    metadata: Metadata,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.format.version)
            .field("page_count", &self.page_count)
            .field("objects", &self.xref.len())
            .field("encrypted", &self.encrypted)
            .finish()
    }
}

impl Document {
    /// Load a document from bytes with default options.
    pub fn load(data: Vec<u8>) -> Result<Self> {
        Self::load_with_options(data, &ParseOptions::default())
    }

    /// Load a document from bytes.
    ///
    /// Fails with [`Error::MalformedDocument`] when the header, cross-reference
    /// data, catalog or page tree root are unusable, and with
    /// [`Error::EncryptedDocument`] when the file is encrypted and no password
    /// was supplied.
    pub fn load_with_options(data: Vec<u8>, options: &ParseOptions) -> Result<Self> {
        let format = detect_format_from_bytes(&data)?;
        let xref = xref::load(&data)?;
        let encrypted = xref.trailer().contains_key("Encrypt");

        if encrypted {
            if options.password.is_none() {
                return Err(Error::EncryptedDocument);
            }
            log::warn!("password supplied but decryption is not supported; text extraction will be refused");
        }

        let mut doc = Document {
            data,
            format,
            xref,
            catalog: Dictionary::new(),
            page_root: (Dictionary::new(), None),
            page_count: 0,
            pages: Vec::new(),
            all_pages: OnceLock::new(),
            objects: RwLock::new(HashMap::new()),
            object_streams: RwLock::new(HashMap::new()),
            fonts: FontCache::new(),
            encrypted,
            metadata: Metadata::default(),
        };

        let root_ref = doc
            .xref
            .trailer()
            .get("Root")
            .cloned()
            .unwrap_or_default();
        doc.catalog = doc
            .resolve(&root_ref)?
            .as_dict()
            .cloned()
            .ok_or_else(|| Error::malformed("document catalog is not a dictionary"))?;

        let pages_ref = doc.catalog.get("Pages").cloned().unwrap_or_default();
        let pages_dict = doc
            .resolve(&pages_ref)?
            .as_dict()
            .cloned()
            .ok_or_else(|| Error::malformed("catalog has no page tree"))?;
        doc.page_root = (pages_dict, pages_ref.as_reference());

        doc.page_count = doc.count_pages()?;
        doc.pages = (0..doc.page_count).map(|_| OnceLock::new()).collect();
        doc.metadata = doc.read_metadata();

        log::debug!(
            "loaded PDF {} ({} pages, {} xref entries{})",
            doc.format.version,
            doc.page_count,
            doc.xref.len(),
            if doc.encrypted { ", encrypted" } else { "" }
        );
        Ok(doc)
    }

    /// Header information.
    pub fn format(&self) -> &PdfFormat {
        &self.format
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of distinct fonts decoded so far.
    pub fn fonts_decoded(&self) -> usize {
        self.fonts.decoded_count()
    }

    /// Look up or decode a font. Each key is decoded at most once, even when
    /// pages are processed concurrently.
    pub fn font(&self, key: FontKey, dict: &Dictionary) -> Arc<Font> {
        self.fonts.get_or_load(key, || Font::load(self, dict))
    }

    /// Fetch an indirect object. Free or undefined objects are `Null`.
    pub fn get_object(&self, id: ObjectId) -> Result<Arc<Object>> {
        let (number, _) = id;
        if let Some(obj) = read_lock(&self.objects).get(&number) {
            return Ok(Arc::clone(obj));
        }
        let obj = Arc::new(self.load_object(number, 0)?);
        let mut cache = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(number).or_insert(obj)))
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&self, obj: &'a Object) -> Result<Resolved<'a>> {
        let Object::Reference(first) = obj else {
            return Ok(Resolved::Direct(obj));
        };
        let mut id = *first;
        for _ in 0..MAX_REFERENCE_HOPS {
            let target = self.get_object(id)?;
            match target.as_ref() {
                Object::Reference(next) => id = *next,
                _ => return Ok(Resolved::Indirect(target)),
            }
        }
        Err(Error::malformed(format!(
            "reference chain starting at {} {} R is too long",
            id.0, id.1
        )))
    }

    /// Resolve an optional dictionary entry.
    pub fn resolve_entry<'a>(&self, dict: &'a Dictionary, key: &str) -> Result<Option<Resolved<'a>>> {
        match dict.get(key) {
            Some(obj) => self.resolve(obj).map(|r| (!r.is_null()).then_some(r)),
            None => Ok(None),
        }
    }

    /// Decode a stream's data through its filter chain.
    pub fn decode_stream(&self, stream: &Stream) -> Result<Vec<u8>> {
        let filter = self.resolve_entry(&stream.dict, "Filter")?;
        let params = self.resolve_entry(&stream.dict, "DecodeParms")?;
        let chain = filters::filter_chain(filter.as_deref(), params.as_deref());
        filters::decode(&stream.data, &chain)
    }

    fn load_object(&self, number: u32, depth: usize) -> Result<Object> {
        if depth > MAX_REFERENCE_HOPS {
            return Err(Error::malformed("object nesting too deep"));
        }
        match self.xref.get(number) {
            None | Some(XrefEntry::Free) => Ok(Object::Null),
            Some(&XrefEntry::InUse { offset, .. }) => {
                if offset >= self.data.len() {
                    return Err(Error::malformed(format!(
                        "object {number} offset {offset} is beyond end of file"
                    )));
                }
                let resolve_length = |id: ObjectId| {
                    self.load_object(id.0, depth + 1)
                        .ok()
                        .and_then(|obj| obj.as_i64())
                };
                let mut parser = ObjectParser::at(&self.data, offset);
                let ((found, _), obj) = parser.parse_indirect_object(&resolve_length)?;
                if found != number {
                    return Err(Error::malformed(format!(
                        "xref entry for object {number} points at object {found}"
                    )));
                }
                Ok(obj)
            }
            Some(&XrefEntry::Compressed { stream, index }) => {
                let objstm = self.object_stream(stream, depth)?;
                objstm.get(number, index)
            }
        }
    }

    fn object_stream(&self, number: u32, depth: usize) -> Result<Arc<ObjectStream>> {
        if let Some(stream) = read_lock(&self.object_streams).get(&number) {
            return Ok(Arc::clone(stream));
        }

        let obj = self.load_object(number, depth + 1)?;
        let stream = obj
            .as_stream()
            .ok_or_else(|| Error::malformed(format!("object stream {number} is not a stream")))?;
        let data = self
            .decode_stream(stream)
            .map_err(|e| Error::malformed(format!("object stream {number}: {e}")))?;

        let count = stream.dict.get("N").and_then(Object::as_i64).unwrap_or(0).max(0) as usize;
        let first = stream.dict.get("First").and_then(Object::as_i64).unwrap_or(0).max(0) as usize;

        let mut header = ObjectParser::new(&data[..first.min(data.len())]);
        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            match (header.parse_object(), header.parse_object()) {
                (Ok(Object::Integer(num)), Ok(Object::Integer(off))) if num >= 0 && off >= 0 => {
                    entries.push((num as u32, first + off as usize));
                }
                _ => break,
            }
        }

        let parsed = Arc::new(ObjectStream { data, entries });
        let mut cache = self
            .object_streams
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(number).or_insert(parsed)))
    }

    fn count_pages(&self) -> Result<u32> {
        let (root, _) = &self.page_root;
        let declared = root.get("Count").and_then(Object::as_i64);
        // Every page needs its own object, which bounds a plausible count.
        match declared {
            Some(count) if count >= 0 && (count as usize) <= self.xref.len() => Ok(count as u32),
            _ => {
                log::debug!("page tree /Count {declared:?} unusable, walking the tree");
                Ok(self.walk_all_pages()?.len() as u32)
            }
        }
    }

    /// Fetch a page by 1-based number, parsing only the path to it.
    pub fn page(&self, number: u32) -> Result<Arc<PageNode>> {
        if number == 0 || number > self.page_count {
            return Err(Error::PageOutOfRange(number, self.page_count));
        }
        let slot = &self.pages[(number - 1) as usize];
        if let Some(node) = slot.get() {
            return Ok(Arc::clone(node));
        }

        let node = match self.find_page(number) {
            Ok(node) => Arc::new(node),
            Err(e) => {
                log::debug!("page {number}: /Count descent failed ({e}), walking the tree");
                self.walk_all_pages()?
                    .get((number - 1) as usize)
                    .cloned()
                    .ok_or_else(|| Error::malformed(format!("page {number} is missing from the page tree")))?
            }
        };
        let _ = slot.set(Arc::clone(&node));
        Ok(slot.get().cloned().unwrap_or(node))
    }

    fn find_page(&self, number: u32) -> Result<PageNode> {
        let (root, root_id) = &self.page_root;
        let mut node = root.clone();
        let mut inherited = Inherited::default();
        inherited.apply(&node, *root_id);
        let mut remaining = number - 1;
        let mut visited: HashSet<ObjectId> = root_id.iter().copied().collect();

        'descend: for _ in 0..MAX_TREE_DEPTH {
            let kids = match self.resolve_entry(&node, "Kids")? {
                Some(kids) => kids.as_array().map(<[Object]>::to_vec).unwrap_or_default(),
                None => Vec::new(),
            };
            for kid in &kids {
                let kid_id = kid.as_reference();
                if let Some(id) = kid_id {
                    if visited.contains(&id) {
                        return Err(Error::malformed("cycle in page tree"));
                    }
                }
                let resolved = self.resolve(kid)?;
                let Some(kid_dict) = resolved.as_dict() else { continue };

                if is_page_tree_node(kid_dict) {
                    let count = match kid_dict.get("Count").and_then(Object::as_i64) {
                        Some(c) if c >= 0 => c as u32,
                        _ => return Err(Error::malformed("intermediate node without /Count")),
                    };
                    if remaining < count {
                        visited.extend(kid_id);
                        inherited.apply(kid_dict, kid_id);
                        node = kid_dict.clone();
                        continue 'descend;
                    }
                    remaining -= count;
                } else {
                    if remaining == 0 {
                        return self.build_page(number, kid_id, kid_dict, &inherited);
                    }
                    remaining -= 1;
                }
            }
            break;
        }
        Err(Error::malformed("page tree /Count is inconsistent"))
    }

    /// Depth-first walk of the whole tree, ignoring `/Count`.
    fn walk_all_pages(&self) -> Result<&Vec<Arc<PageNode>>> {
        if let Some(pages) = self.all_pages.get() {
            return Ok(pages);
        }
        let (root, root_id) = &self.page_root;
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut inherited = Inherited::default();
        inherited.apply(root, *root_id);
        visited.extend(*root_id);
        self.walk_node(root, &inherited, &mut visited, &mut pages, 0)?;
        let _ = self.all_pages.set(pages);
        self.all_pages
            .get()
            .ok_or_else(|| Error::malformed("page tree walk failed"))
    }

    fn walk_node(
        &self,
        node: &Dictionary,
        inherited: &Inherited,
        visited: &mut HashSet<ObjectId>,
        pages: &mut Vec<Arc<PageNode>>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_TREE_DEPTH {
            return Err(Error::malformed("page tree too deep"));
        }
        let kids = match self.resolve_entry(node, "Kids")? {
            Some(kids) => kids.as_array().map(<[Object]>::to_vec).unwrap_or_default(),
            None => return Ok(()),
        };
        for kid in &kids {
            let kid_id = kid.as_reference();
            if let Some(id) = kid_id {
                if !visited.insert(id) {
                    log::debug!("skipping repeated page tree node {} {} R", id.0, id.1);
                    continue;
                }
            }
            let resolved = self.resolve(kid)?;
            let Some(kid_dict) = resolved.as_dict() else { continue };
            if is_page_tree_node(kid_dict) {
                let mut child = inherited.clone();
                child.apply(kid_dict, kid_id);
                self.walk_node(kid_dict, &child, visited, pages, depth + 1)?;
            } else {
                let number = pages.len() as u32 + 1;
                pages.push(Arc::new(self.build_page(number, kid_id, kid_dict, inherited)?));
            }
        }
        Ok(())
    }

    fn build_page(
        &self,
        number: u32,
        id: Option<ObjectId>,
        dict: &Dictionary,
        inherited: &Inherited,
    ) -> Result<PageNode> {
        let mut own = inherited.clone();
        own.apply(dict, id);

        let (resources, resources_owner) = match &own.resources {
            Some((obj, owner)) => (
                self.resolve(obj)?.as_dict().cloned().unwrap_or_default(),
                *owner,
            ),
            None => (Dictionary::new(), id),
        };

        let media_box = match &own.media_box {
            Some(obj) => self.resolve(obj)?.as_array().and_then(|values| {
                let nums: Vec<f64> = values.iter().filter_map(Object::as_f64).collect();
                let [ax, ay, bx, by] = <[f64; 4]>::try_from(nums.as_slice()).ok()?;
                Some([ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)])
            }),
            None => None,
        };

        Ok(PageNode {
            number,
            id,
            dict: dict.clone(),
            resources,
            resources_owner,
            media_box,
        })
    }

    fn read_metadata(&self) -> Metadata {
        let mut version = self.format.version.clone();
        // A catalog /Version overrides an older header version.
        if let Some(catalog_version) = dict_name(&self.catalog, "Version") {
            if catalog_version > version.as_str() {
                version = catalog_version.to_string();
            }
        }
        let mut metadata = Metadata::with_version(version);
        metadata.page_count = self.page_count;
        metadata.encrypted = self.encrypted;

        // /Info strings are encrypted too; there is nothing readable to report.
        if self.encrypted {
            return metadata;
        }
        let info = match self.resolve_entry(self.xref.trailer(), "Info") {
            Ok(Some(info)) => info.as_dict().cloned().unwrap_or_default(),
            Ok(None) => return metadata,
            Err(e) => {
                log::debug!("ignoring unreadable /Info: {e}");
                return metadata;
            }
        };
        let resolved: Dictionary = info
            .iter()
            .filter_map(|(key, value)| {
                let value = self.resolve(value).ok()?;
                Some((key.clone(), (*value).clone()))
            })
            .collect();
        metadata.read_info(&resolved);
        metadata
    }
}

impl ObjectStream {
    fn get(&self, number: u32, index: u32) -> Result<Object> {
        let offset = self
            .entries
            .get(index as usize)
            .filter(|(n, _)| *n == number)
            .or_else(|| self.entries.iter().find(|(n, _)| *n == number))
            .map(|(_, offset)| *offset)
            .ok_or_else(|| Error::malformed(format!("object {number} missing from its object stream")))?;
        ObjectParser::at(&self.data, offset).parse_object()
    }
}

fn is_page_tree_node(dict: &Dictionary) -> bool {
    match dict_name(dict, "Type") {
        Some("Pages") => true,
        Some("Page") => false,
        _ => dict.contains_key("Kids"),
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}


#[cfg(test)]
mod tests {
    use super::testing::document;

    #[test]
    fn test_media_box_is_inherited_and_normalized() {
        let doc = document(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [612 792 0 0] >>",
            "<< /Type /Page /Parent 2 0 R >>",
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 400] >>",
        ]);
        assert_eq!(doc.page(1).unwrap().media_box, Some([0.0, 0.0, 612.0, 792.0]));
        assert_eq!(doc.page(2).unwrap().media_box, Some([0.0, 0.0, 300.0, 400.0]));
    }

    #[test]
    fn test_direct_page_dictionaries_have_no_resource_owner() {
        let doc = document(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [<< /Type /Page /Resources << >> >> << /Type /Page >>] /Count 2 >>",
        ]);
        assert_eq!(doc.page_count(), 2);
        let first = doc.page(1).unwrap();
        assert_eq!(first.id, None);
        assert_eq!(first.resources_owner, None);
    }
}
