//! Page decoding: the concatenated content stream plus its resources.

use super::document::{Document, PageNode, Resolved};
use super::object::{Dictionary, Object, ObjectId};
use crate::error::Result;
use crate::font::{Font, FontKey};
use crate::model::GlyphRun;
use std::sync::Arc;

/// A page ready for interpretation.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    /// Decoded content, with multiple content streams joined by a newline.
    pub content: Vec<u8>,
    pub resources: Resources,
    /// Effective `/MediaBox` as `[x0 y0 x1 y1]`, normalized so `x0 <= x1`
    /// and `y0 <= y1`.
    pub media_box: Option<[f64; 4]>,
}

impl Page {
    /// Whether any part of a run falls on the page.
    ///
    /// A run spans its advance horizontally and its font size vertically.
    /// Pages without a usable `/MediaBox` keep everything.
    pub fn is_visible(&self, run: &GlyphRun) -> bool {
        let Some([x0, y0, x1, y1]) = self.media_box else {
            return true;
        };
        let (left, right) = if run.advance < 0.0 {
            (run.end_x(), run.x)
        } else {
            (run.x, run.end_x())
        };
        let (bottom, top) = (run.y, run.y + run.font_size);
        right >= x0 && left <= x1 && top >= y0 && bottom <= y1
    }
}

/// A resource dictionary together with the object that owns it.
///
/// Form XObjects get their own `Resources` whose `parent` is the resources of
/// the content that invoked them; names missing from a form are looked up in
/// the parent.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub dict: Dictionary,
    /// Identifies inline font dictionaries in the font cache.
    pub owner: Option<ObjectId>,
    /// Page the resources were reached from; keys inline fonts when there
    /// is no owning object.
    pub page: u32,
    parent: Option<Arc<Resources>>,
}

impl Resources {
    pub fn new(dict: Dictionary, owner: Option<ObjectId>, page: u32) -> Self {
        Self {
            dict,
            owner,
            page,
            parent: None,
        }
    }

    /// Resources of a form invoked from `parent`.
    pub fn nested(dict: Dictionary, owner: Option<ObjectId>, parent: &Resources) -> Self {
        Self {
            dict,
            owner: owner.or(parent.owner),
            page: parent.page,
            parent: Some(Arc::new(parent.clone())),
        }
    }

    /// Look up `/Font /<name>` and return the cached font.
    ///
    /// `None` when the resource is missing here and in every parent, or is
    /// not a dictionary.
    pub fn font(&self, doc: &Document, name: &str) -> Option<Arc<Font>> {
        self.own_font(doc, name)
            .or_else(|| self.parent.as_ref()?.font(doc, name))
    }

    fn own_font(&self, doc: &Document, name: &str) -> Option<Arc<Font>> {
        let fonts = doc.resolve_entry(&self.dict, "Font").ok().flatten()?;
        let entry = fonts.as_dict()?.get(name)?;
        let key = match entry.as_reference() {
            Some(id) => FontKey::Object(id),
            None => FontKey::Inline {
                owner: self.owner,
                page: self.owner.is_none().then_some(self.page),
                name: name.to_string(),
            },
        };
        let resolved = doc.resolve(entry).ok()?;
        let dict = resolved.as_dict()?;
        Some(doc.font(key, dict))
    }

    /// Look up `/XObject /<name>`, returning its object id (if indirect) and
    /// the object itself.
    pub fn xobject(&self, doc: &Document, name: &str) -> Option<(Option<ObjectId>, Arc<Object>)> {
        self.own_xobject(doc, name)
            .or_else(|| self.parent.as_ref()?.xobject(doc, name))
    }

    fn own_xobject(&self, doc: &Document, name: &str) -> Option<(Option<ObjectId>, Arc<Object>)> {
        let xobjects = doc.resolve_entry(&self.dict, "XObject").ok().flatten()?;
        let entry = xobjects.as_dict()?.get(name)?;
        let id = entry.as_reference();
        let object = match doc.resolve(entry).ok()? {
            Resolved::Indirect(shared) => shared,
            Resolved::Direct(inline) => Arc::new(inline.clone()),
        };
        Some((id, object))
    }
}

impl Document {
    /// Decode a page's content streams.
    ///
    /// Structural problems are [`Error::MalformedDocument`]; a filter that
    /// cannot be applied is [`Error::UnsupportedFilter`] or
    /// [`Error::StreamDecode`], which callers may treat as recoverable.
    ///
    /// [`Error::MalformedDocument`]: crate::Error::MalformedDocument
    /// [`Error::UnsupportedFilter`]: crate::Error::UnsupportedFilter
    /// [`Error::StreamDecode`]: crate::Error::StreamDecode
    pub fn decode_page(&self, number: u32) -> Result<Page> {
        let node = self.page(number)?;
        let content = self.page_content(&node)?;
        Ok(Page {
            number,
            content,
            resources: Resources::new(node.resources.clone(), node.resources_owner, number),
            media_box: node.media_box,
        })
    }

    fn page_content(&self, node: &PageNode) -> Result<Vec<u8>> {
        let Some(contents) = self.resolve_entry(&node.dict, "Contents")? else {
            return Ok(Vec::new());
        };

        let streams: Vec<Object> = match &*contents {
            Object::Array(items) => items.clone(),
            other => vec![other.clone()],
        };

        let mut content = Vec::new();
        for item in &streams {
            let resolved = self.resolve(item)?;
            let Some(stream) = resolved.as_stream() else {
                log::debug!(
                    "page {}: skipping /Contents entry of type {}",
                    node.number,
                    resolved.type_name()
                );
                continue;
            };
            let data = self.decode_stream(stream)?;
            if !content.is_empty() {
                content.push(b'\n');
            }
            content.extend_from_slice(&data);
        }
        Ok(content)
    }
}
