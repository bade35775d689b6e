//! In-memory document handle over the lopdf object model.
//!
//! [`PdfFile`] wraps a parsed `lopdf::Document` together with its ordered page
//! list. Operations that rebuild a document go through [`assemble`], which
//! deep-copies page object graphs from one or more sources into a fresh
//! target; a source is never aliased into an output, so derivative documents
//! cannot mutate each other.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::operations::{OperationError, OperationResult};

/// Default page box used when a malformed document carries none (US Letter).
const FALLBACK_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Depth limit when walking Parent chains of malformed page trees.
const MAX_TREE_DEPTH: usize = 10;

/// A loaded PDF document plus its ordered page object list.
pub struct PdfFile {
    doc: Document,
    pages: Vec<ObjectId>,
    next_name: u32,
}

impl PdfFile {
    /// Parse a document from memory.
    pub fn load(bytes: &[u8]) -> OperationResult<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| OperationError::Codec(e.to_string()))?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self {
            doc,
            pages,
            next_name: 0,
        })
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize, pruning orphaned objects and compressing streams.
    pub fn save(mut self) -> OperationResult<Vec<u8>> {
        self.doc.prune_objects();
        self.doc.compress();
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| OperationError::Codec(e.to_string()))?;
        Ok(buffer)
    }

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Object id of a page, re-validating the index.
    pub(crate) fn page_id(&self, index: usize) -> OperationResult<ObjectId> {
        self.pages
            .get(index)
            .copied()
            .ok_or(OperationError::PageIndexOutOfRange {
                index,
                page_count: self.pages.len(),
            })
    }

    fn page_dict(&self, index: usize) -> OperationResult<&Dictionary> {
        let id = self.page_id(index)?;
        self.doc
            .get_dictionary(id)
            .map_err(|e| OperationError::Codec(e.to_string()))
    }

    fn page_dict_mut(&mut self, index: usize) -> OperationResult<&mut Dictionary> {
        let id = self.page_id(index)?;
        match self.doc.get_object_mut(id) {
            Ok(Object::Dictionary(dict)) => Ok(dict),
            Ok(_) => Err(OperationError::Codec(format!(
                "page object {} is not a dictionary",
                id.0
            ))),
            Err(e) => Err(OperationError::Codec(e.to_string())),
        }
    }

    /// The page's media box, honouring inherited entries.
    pub(crate) fn media_box(&self, index: usize) -> OperationResult<[f64; 4]> {
        let dict = self.page_dict(index)?;
        Ok(self
            .inherited_entry(dict, b"MediaBox")
            .and_then(|obj| media_box_values(&self.doc, &obj))
            .unwrap_or(FALLBACK_MEDIA_BOX))
    }

    /// Page (width, height) in points.
    pub fn page_size(&self, index: usize) -> OperationResult<(f64, f64)> {
        let mb = self.media_box(index)?;
        Ok((mb[2] - mb[0], mb[3] - mb[1]))
    }

    pub(crate) fn set_media_box(&mut self, index: usize, mb: [f64; 4]) -> OperationResult<()> {
        let dict = self.page_dict_mut(index)?;
        dict.set("MediaBox", media_box_object(mb));
        // Stale crop boxes would clip the resized canvas
        dict.remove(b"CropBox");
        Ok(())
    }

    pub(crate) fn set_crop_box(&mut self, index: usize, mb: [f64; 4]) -> OperationResult<()> {
        let dict = self.page_dict_mut(index)?;
        dict.set("CropBox", media_box_object(mb));
        Ok(())
    }

    /// The page's rotation in degrees (0, 90, 180 or 270).
    pub fn rotation(&self, index: usize) -> OperationResult<i64> {
        let dict = self.page_dict(index)?;
        let rotation = self
            .inherited_entry(dict, b"Rotate")
            .and_then(|obj| match obj {
                Object::Integer(value) => Some(value),
                _ => None,
            })
            .unwrap_or(0);
        Ok(rotation.rem_euclid(360))
    }

    pub(crate) fn set_rotation(&mut self, index: usize, degrees: i64) -> OperationResult<()> {
        let dict = self.page_dict_mut(index)?;
        dict.set("Rotate", Object::Integer(degrees.rem_euclid(360)));
        Ok(())
    }

    /// Look up an inheritable page attribute, walking the Parent chain.
    fn inherited_entry(&self, dict: &Dictionary, key: &[u8]) -> Option<Object> {
        let mut current = dict.clone();
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value.clone());
            }
            let parent_id = match current.get(b"Parent") {
                Ok(Object::Reference(id)) => *id,
                _ => return None,
            };
            current = self.doc.get_dictionary(parent_id).ok()?.clone();
        }
        None
    }

    /// Append a content stream to a page, after its existing content.
    pub(crate) fn append_content(&mut self, index: usize, content: String) -> OperationResult<()> {
        let stream = Stream::new(Dictionary::new(), content.into_bytes());
        let stream_id = self.doc.add_object(Object::Stream(stream));
        let dict = self.page_dict_mut(index)?;

        let existing = dict.get(b"Contents").ok().cloned();
        match existing {
            Some(Object::Reference(existing)) => {
                dict.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(existing),
                        Object::Reference(stream_id),
                    ]),
                );
            }
            Some(Object::Array(mut refs)) => {
                refs.push(Object::Reference(stream_id));
                dict.set("Contents", Object::Array(refs));
            }
            _ => {
                dict.set("Contents", Object::Reference(stream_id));
            }
        }
        Ok(())
    }

    /// Bracket a page's existing content between two new streams.
    ///
    /// Used to re-position everything a page already draws, e.g. translating
    /// content into an enlarged canvas.
    pub(crate) fn wrap_content(
        &mut self,
        index: usize,
        prefix: String,
        suffix: String,
    ) -> OperationResult<()> {
        let prefix_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), prefix.into_bytes())));
        let suffix_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), suffix.into_bytes())));

        let dict = self.page_dict_mut(index)?;
        let existing = dict.get(b"Contents").ok().cloned();
        let mut refs = vec![Object::Reference(prefix_id)];
        match existing {
            Some(Object::Reference(id)) => refs.push(Object::Reference(id)),
            Some(Object::Array(entries)) => refs.extend(entries),
            _ => {}
        }
        refs.push(Object::Reference(suffix_id));
        dict.set("Contents", Object::Array(refs));
        Ok(())
    }

    /// Shift every annotation rectangle on a page by `(dx, dy)`.
    pub(crate) fn translate_annotations(
        &mut self,
        index: usize,
        dx: f64,
        dy: f64,
    ) -> OperationResult<()> {
        let annot_ids: Vec<ObjectId> = {
            let dict = self.page_dict(index)?;
            match dict.get(b"Annots") {
                Ok(Object::Array(entries)) => entries
                    .iter()
                    .filter_map(|entry| entry.as_reference().ok())
                    .collect(),
                _ => Vec::new(),
            }
        };

        for annot_id in annot_ids {
            if let Ok(Object::Dictionary(annot)) = self.doc.get_object_mut(annot_id) {
                let values: Vec<f64> = match annot.get(b"Rect") {
                    Ok(Object::Array(rect)) => rect.iter().filter_map(number_value).collect(),
                    _ => Vec::new(),
                };
                if values.len() == 4 {
                    annot.set(
                        "Rect",
                        Object::Array(vec![
                            Object::Real((values[0] + dx) as f32),
                            Object::Real((values[1] + dy) as f32),
                            Object::Real((values[2] + dx) as f32),
                            Object::Real((values[3] + dy) as f32),
                        ]),
                    );
                }
            }
        }
        Ok(())
    }

    /// Make sure the page owns an inline resources dictionary, resolving
    /// references and inherited entries into a local copy.
    fn localize_resources(&mut self, index: usize) -> OperationResult<()> {
        let resolved: Dictionary = {
            let dict = self.page_dict(index)?;
            match self.inherited_entry(dict, b"Resources") {
                Some(Object::Dictionary(resources)) => resources,
                Some(Object::Reference(id)) => self
                    .doc
                    .get_dictionary(id)
                    .map(Clone::clone)
                    .unwrap_or_default(),
                _ => Dictionary::new(),
            }
        };

        // Inline the sub-dictionaries overlays touch so they can be extended
        // without mutating objects shared with other pages.
        let mut resources = resolved;
        for key in [b"Font".as_slice(), b"XObject".as_slice(), b"ExtGState".as_slice()] {
            let referenced = match resources.get(key) {
                Ok(Object::Reference(id)) => Some(*id),
                _ => None,
            };
            if let Some(id) = referenced {
                if let Ok(sub) = self.doc.get_dictionary(id) {
                    let sub = sub.clone();
                    resources.set(key, Object::Dictionary(sub));
                }
            }
        }

        let dict = self.page_dict_mut(index)?;
        dict.set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn with_resources<F>(&mut self, index: usize, f: F) -> OperationResult<()>
    where
        F: FnOnce(&mut Dictionary),
    {
        self.localize_resources(index)?;
        let dict = self.page_dict_mut(index)?;
        if let Ok(Object::Dictionary(resources)) = dict.get_mut(b"Resources") {
            f(resources);
        }
        Ok(())
    }

    fn fresh_name(&mut self, prefix: &str) -> String {
        self.next_name += 1;
        format!("{}{}", prefix, self.next_name)
    }

    /// Register the standard Helvetica font on a page, returning its resource
    /// name. Idempotent per document.
    pub(crate) fn register_helvetica(&mut self, index: usize) -> OperationResult<String> {
        let name = "PFHelv".to_string();
        let font = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]);
        let key = name.clone();
        self.with_resources(index, move |resources| {
            let fonts = ensure_subdict(resources, b"Font");
            if !fonts.has(key.as_bytes()) {
                fonts.set(key, Object::Dictionary(font));
            }
        })?;
        Ok(name)
    }

    /// Register an XObject on a page under a fresh name.
    pub(crate) fn register_xobject(
        &mut self,
        index: usize,
        object_id: ObjectId,
    ) -> OperationResult<String> {
        let name = self.fresh_name("PFx");
        let key = name.clone();
        self.with_resources(index, move |resources| {
            let xobjects = ensure_subdict(resources, b"XObject");
            xobjects.set(key, Object::Reference(object_id));
        })?;
        Ok(name)
    }

    /// Register an ExtGState carrying fill and stroke opacity.
    pub(crate) fn register_opacity(
        &mut self,
        index: usize,
        opacity: f64,
    ) -> OperationResult<String> {
        let name = self.fresh_name("PFgs");
        let state = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(opacity as f32)),
            ("CA", Object::Real(opacity as f32)),
        ]);
        let key = name.clone();
        self.with_resources(index, move |resources| {
            let states = ensure_subdict(resources, b"ExtGState");
            states.set(key, Object::Dictionary(state));
        })?;
        Ok(name)
    }

    /// Import every object of `other` into this document with fresh ids.
    ///
    /// Returns the renumbered page ids of `other` in page order. The imported
    /// pages are not wired into this document's page tree; anything left
    /// unreferenced is pruned at save time.
    pub(crate) fn import_objects(&mut self, other: &PdfFile) -> Vec<ObjectId> {
        let mut imported = other.doc.clone();
        imported.renumber_objects_with(self.doc.max_id + 1);
        self.doc.max_id = imported.max_id;

        let page_ids: Vec<ObjectId> = imported.get_pages().into_values().collect();
        for (id, object) in std::mem::take(&mut imported.objects) {
            if !is_page_tree_node(&object) {
                self.doc.objects.insert(id, object);
            }
        }
        page_ids
    }

    /// Turn a page object (own or imported) into a Form XObject.
    ///
    /// The form's BBox is the page's media box and its resources are the
    /// page's resolved resources, so the page draws identically when placed
    /// through a transform.
    pub(crate) fn form_from_page(&mut self, page_id: ObjectId) -> OperationResult<ObjectId> {
        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| OperationError::Codec(e.to_string()))?;

        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| OperationError::Codec(e.to_string()))?;

        let media_box = self
            .inherited_entry(page, b"MediaBox")
            .and_then(|obj| media_box_values(&self.doc, &obj))
            .unwrap_or(FALLBACK_MEDIA_BOX);

        let resources = match self.inherited_entry(page, b"Resources") {
            Some(Object::Dictionary(resources)) => resources,
            Some(Object::Reference(id)) => self
                .doc
                .get_dictionary(id)
                .map(Clone::clone)
                .unwrap_or_default(),
            _ => Dictionary::new(),
        };

        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Form".to_vec())),
            ("BBox", media_box_object(media_box)),
            ("Resources", Object::Dictionary(resources)),
        ]);
        Ok(self.doc.add_object(Object::Stream(Stream::new(dict, content))))
    }

    /// Swap a page for a fresh canvas of `width` x `height` that draws
    /// `form_id` through `transform` (a PDF `cm` matrix). The page keeps its
    /// object id, so the page tree stays untouched.
    pub(crate) fn replace_page_with_form(
        &mut self,
        index: usize,
        form_id: ObjectId,
        width: f64,
        height: f64,
        transform: [f64; 6],
    ) -> OperationResult<()> {
        let content = format!(
            "q\n{:.5} {:.5} {:.5} {:.5} {:.2} {:.2} cm\n/PFpg Do\nQ",
            transform[0], transform[1], transform[2], transform[3], transform[4], transform[5],
        );
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())));

        let parent = {
            let dict = self.page_dict(index)?;
            dict.get(b"Parent").ok().cloned()
        };

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "PFpg",
                Object::Reference(form_id),
            )])),
        )]);

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("MediaBox", media_box_object([0.0, 0.0, width, height])),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(parent) = parent {
            page.set("Parent", parent);
        }

        let page_id = self.page_id(index)?;
        if let Some(slot) = self.doc.objects.get_mut(&page_id) {
            *slot = Object::Dictionary(page);
        }
        Ok(())
    }
}

fn ensure_subdict<'a>(resources: &'a mut Dictionary, key: &[u8]) -> &'a mut Dictionary {
    let needs_init = !matches!(resources.get(key), Ok(Object::Dictionary(_)));
    if needs_init {
        resources.set(key, Object::Dictionary(Dictionary::new()));
    }
    match resources.get_mut(key) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => unreachable!("subdictionary was just initialized"),
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type"),
        Ok(Object::Name(name)) if name == b"Catalog" || name == b"Pages" || name == b"Outlines"
    )
}

fn number_value(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn media_box_values(doc: &Document, object: &Object) -> Option<[f64; 4]> {
    let entries = match object {
        Object::Array(entries) => entries.clone(),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(entries)) => entries.clone(),
            _ => return None,
        },
        _ => return None,
    };
    let values: Vec<f64> = entries.iter().filter_map(number_value).collect();
    if values.len() == 4 {
        Some([values[0], values[1], values[2], values[3]])
    } else {
        None
    }
}

fn media_box_object(mb: [f64; 4]) -> Object {
    Object::Array(vec![
        Object::Real(mb[0] as f32),
        Object::Real(mb[1] as f32),
        Object::Real(mb[2] as f32),
        Object::Real(mb[3] as f32),
    ])
}

/// Escape text for inclusion in a PDF literal string.
pub(crate) fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One entry in an [`assemble`] page sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PagePick {
    /// Copy page `page` of `sources[source]`.
    Source { source: usize, page: usize },
    /// Insert a fresh empty page of the given size.
    Blank { width: f64, height: f64 },
}

/// Build a new document from pages of one or more source documents.
///
/// Every source's object table is deep-copied with renumbered ids, so the
/// output shares nothing with its inputs. Picks may repeat a page; repeated
/// picks get their own page dictionary (sharing content streams inside the
/// new document only). Document info of the first source is carried over.
pub(crate) fn assemble(sources: &[&PdfFile], picks: &[PagePick]) -> OperationResult<PdfFile> {
    if picks.is_empty() {
        return Err(OperationError::EmptySelection("no pages selected"));
    }

    let mut dest = Document::with_version("1.5");
    let mut next_id = 1u32;
    let mut source_pages: Vec<Vec<ObjectId>> = Vec::with_capacity(sources.len());
    let mut info: Option<Dictionary> = None;

    for (source_index, source) in sources.iter().enumerate() {
        let mut imported = source.doc.clone();
        imported.renumber_objects_with(next_id);
        next_id = imported.max_id + 1;

        if source_index == 0 {
            info = document_info(&imported);
        }

        source_pages.push(imported.get_pages().into_values().collect());
        for (id, object) in std::mem::take(&mut imported.objects) {
            if !is_page_tree_node(&object) {
                dest.objects.insert(id, object);
            }
        }
    }
    dest.max_id = next_id - 1;

    let pages_id = dest.new_object_id();
    let mut kids = Vec::with_capacity(picks.len());
    let mut seen: HashSet<ObjectId> = HashSet::new();

    for pick in picks {
        let page_id = match *pick {
            PagePick::Source { source, page } => {
                let pages = source_pages
                    .get(source)
                    .ok_or(OperationError::EmptySelection("unknown source document"))?;
                let page_id = pages.get(page).copied().ok_or({
                    OperationError::PageIndexOutOfRange {
                        index: page,
                        page_count: pages.len(),
                    }
                })?;
                if seen.insert(page_id) {
                    page_id
                } else {
                    // Repeated pick: give the copy its own page dictionary so
                    // each kid is a distinct object in the tree.
                    let copy = dest
                        .objects
                        .get(&page_id)
                        .cloned()
                        .ok_or_else(|| OperationError::Codec("page object missing".into()))?;
                    dest.add_object(copy)
                }
            }
            PagePick::Blank { width, height } => {
                let page = Dictionary::from_iter(vec![
                    ("Type", Object::Name(b"Page".to_vec())),
                    ("MediaBox", media_box_object([0.0, 0.0, width, height])),
                    ("Resources", Object::Dictionary(Dictionary::new())),
                ]);
                dest.add_object(Object::Dictionary(page))
            }
        };

        if let Ok(Object::Dictionary(page)) = dest.get_object_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_count as i64)),
    ]);
    dest.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = dest.add_object(Object::Dictionary(catalog));
    dest.trailer.set("Root", Object::Reference(catalog_id));

    if let Some(info) = info {
        let info_id = dest.add_object(Object::Dictionary(info));
        dest.trailer.set("Info", Object::Reference(info_id));
    }

    dest.renumber_objects();
    let pages = dest.get_pages().into_values().collect();
    Ok(PdfFile {
        doc: dest,
        pages,
        next_name: 0,
    })
}

/// Copy the listed pages of one source into a fresh document, in list order.
pub(crate) fn extract(source: &PdfFile, indices: &[usize]) -> OperationResult<PdfFile> {
    let picks: Vec<PagePick> = indices
        .iter()
        .map(|&page| PagePick::Source { source: 0, page })
        .collect();
    assemble(&[source], &picks)
}

fn document_info(doc: &Document) -> Option<Dictionary> {
    match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok().cloned(),
        Ok(Object::Dictionary(dict)) => Some(dict.clone()),
        _ => None,
    }
}
