//! Per-drawer state: items, their load lifecycle, tooltip ownership.
//!
//! Every transition takes `&mut DrawerContext`, so handlers never overlap.
//! Async work (fetching media) happens outside the context and reports back
//! through [`DrawerContext::on_media_loaded`] or
//! [`DrawerContext::on_fetch_failed`]. Completions for items that were
//! removed in the meantime are dropped.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use imagedrawer_metadata::{MediaFormat, MetadataMap};

use crate::config::{DrawerSettings, VideoOptions};
use crate::descriptor::{FileInfo, MediaDescriptor};
use crate::display::{self, CopyEntry, DisplayBundle, TooltipRow};
use crate::error::{DrawerError, Result};
use crate::filter::KeyFilter;
use crate::gate::{LoadAction, LoadState};

/// Gap between the pointer and the tooltip, in pixels.
pub const TOOLTIP_OFFSET: (i32, i32) = (10, 10);

/// Extra bottom margin so the tooltip does not cover the browser link hint.
const TOOLTIP_BOTTOM_MARGIN: i32 = 10;

/// Handle for an item inside one [`DrawerContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order in which items are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Insertion order.
    #[default]
    Added,
    NameAscending,
    NameDescending,
    /// Newest first.
    Newest,
    Oldest,
    /// Largest first; unknown sizes sort last.
    Largest,
    Smallest,
}

/// One drawer item and everything derived from its metadata.
#[derive(Debug, Clone)]
pub struct DrawerItem {
    descriptor: MediaDescriptor,
    load: LoadState,
    bundle: Option<DisplayBundle>,
    base_terms: String,
    search_terms: String,
}

impl DrawerItem {
    fn new(descriptor: MediaDescriptor) -> Self {
        let base_terms = descriptor.view_path(None);
        Self {
            search_terms: base_terms.clone(),
            base_terms,
            descriptor,
            load: LoadState::default(),
            bundle: None,
        }
    }

    pub fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn metadata(&self) -> Option<&MetadataMap> {
        self.load.metadata()
    }

    /// Tooltip rows and search text, once metadata has been attached.
    pub fn bundle(&self) -> Option<&DisplayBundle> {
        self.bundle.as_ref()
    }

    /// The item's view path followed by its flattened metadata.
    pub fn search_terms(&self) -> &str {
        &self.search_terms
    }

    /// Entries for the item's copy menu. Empty until metadata is attached.
    pub fn copy_entries(&self) -> Vec<CopyEntry> {
        self.metadata().map(display::copy_entries).unwrap_or_default()
    }

    /// Case-insensitive match of every whitespace-separated query term
    /// against the search terms. An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let haystack = self.search_terms.to_lowercase();
        query
            .split_whitespace()
            .all(|term| haystack.contains(&term.to_lowercase()))
    }

    fn recompose(&mut self, filter: &KeyFilter) {
        self.bundle = self.load.metadata().map(|m| display::compose(m, filter));
        self.search_terms = match &self.bundle {
            Some(bundle) => format!("{} {}", self.base_terms, bundle.search_text),
            None => self.base_terms.clone(),
        };
    }
}

/// Tooltip currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooltipView<'a> {
    pub owner: ItemId,
    pub rows: &'a [TooltipRow],
}

/// State owned by a single drawer.
#[derive(Debug, Default)]
pub struct DrawerContext {
    key_filter: KeyFilter,
    video: VideoOptions,
    video_extensions: Vec<String>,
    items: BTreeMap<ItemId, DrawerItem>,
    next_id: u64,
    hovered: Option<ItemId>,
    tooltip_owner: Option<ItemId>,
    tooltip_visible: bool,
    tool_button_owner: Option<ItemId>,
}

impl DrawerContext {
    pub fn new(key_filter: KeyFilter, video: VideoOptions) -> Self {
        Self {
            key_filter,
            video,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &DrawerSettings) -> Self {
        Self {
            video_extensions: settings.video_extensions.clone(),
            ..Self::new(settings.key_filter(), settings.video)
        }
    }

    pub fn key_filter(&self) -> &KeyFilter {
        &self.key_filter
    }

    /// Playback defaults for video items.
    pub fn video_options(&self) -> VideoOptions {
        self.video
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&DrawerItem> {
        self.items.get(&id)
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &DrawerItem)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Add an item and run the lazy-load gate for it.
    pub fn add_item(
        &mut self,
        descriptor: MediaDescriptor,
        force_load: bool,
    ) -> Result<(ItemId, LoadAction)> {
        let id = ItemId(self.next_id);
        self.next_id += 1;

        let mut item = DrawerItem::new(descriptor);
        let action = item.load.begin(&item.descriptor, force_load)?;

        tracing::debug!(
            item = %id,
            filename = %item.descriptor.filename,
            ?action,
            "Added drawer item"
        );
        self.items.insert(id, item);
        Ok((id, action))
    }

    /// Add an item straight from a backend listing entry.
    pub fn add_file_info(&mut self, info: FileInfo, force_load: bool) -> Result<(ItemId, LoadAction)> {
        let descriptor = MediaDescriptor::from_file_info(info, &self.video_extensions);
        self.add_item(descriptor, force_load)
    }

    /// Drop an item. Pending completions for it will be ignored.
    pub fn remove_item(&mut self, id: ItemId) -> Option<DrawerItem> {
        let removed = self.items.remove(&id)?;
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.tooltip_owner == Some(id) {
            self.tooltip_owner = None;
            self.tooltip_visible = false;
        }
        if self.tool_button_owner == Some(id) {
            self.tool_button_owner = None;
        }
        Some(removed)
    }

    /// The item scrolled into view (or was forced). Returns whether a fetch
    /// should be started.
    pub fn on_visible(&mut self, id: ItemId) -> Result<LoadAction> {
        let item = self.items.get_mut(&id).ok_or(DrawerError::UnknownItem(id))?;
        item.load.trigger()
    }

    /// Media bytes for `id` arrived. Extracts metadata, composes the display
    /// bundle and extends the search terms.
    ///
    /// Returns `Ok(false)` when the item no longer exists.
    pub fn on_media_loaded(&mut self, id: ItemId, blob: &[u8]) -> Result<bool> {
        let Some(item) = self.items.get_mut(&id) else {
            tracing::debug!(item = %id, "Ignoring media for removed item");
            return Ok(false);
        };

        let format = MediaFormat::detect(&item.descriptor.filename, blob);
        let metadata = if format == MediaFormat::Other {
            None
        } else {
            imagedrawer_metadata::extract(blob, format)
        };

        tracing::debug!(
            item = %id,
            filename = %item.descriptor.filename,
            %format,
            entries = metadata.as_ref().map_or(0, MetadataMap::len),
            "Media loaded"
        );

        item.load.complete(metadata)?;
        item.recompose(&self.key_filter);

        let has_tooltip = item.bundle.as_ref().is_some_and(DisplayBundle::has_tooltip);
        if has_tooltip && self.hovered == Some(id) {
            self.tooltip_owner = Some(id);
            self.tooltip_visible = true;
        }
        Ok(true)
    }

    /// Fetching media for `id` failed. The item settles without metadata.
    ///
    /// Returns `Ok(false)` when the item no longer exists.
    pub fn on_fetch_failed(&mut self, id: ItemId) -> Result<bool> {
        let Some(item) = self.items.get_mut(&id) else {
            tracing::debug!(item = %id, "Ignoring fetch failure for removed item");
            return Ok(false);
        };
        item.load.fail()?;
        item.recompose(&self.key_filter);
        Ok(true)
    }

    /// Pointer entered `id`: it takes over the tooltip and the tool button.
    pub fn on_mouse_over(&mut self, id: ItemId) -> Result<Option<TooltipView<'_>>> {
        let item = self.items.get(&id).ok_or(DrawerError::UnknownItem(id))?;
        let has_tooltip = item.bundle.as_ref().is_some_and(DisplayBundle::has_tooltip);

        self.hovered = Some(id);
        self.tool_button_owner = Some(id);
        self.tooltip_owner = Some(id);
        self.tooltip_visible = has_tooltip;

        Ok(self.visible_tooltip())
    }

    /// Pointer left `id`. Only the current owner can hide the tooltip or
    /// lose the tool button.
    pub fn on_mouse_out(&mut self, id: ItemId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.tooltip_owner == Some(id) {
            self.tooltip_visible = false;
        }
        if self.tool_button_owner == Some(id) {
            self.tool_button_owner = None;
        }
    }

    /// Dragging an item removes its tool button.
    pub fn on_drag_start(&mut self, id: ItemId) {
        if self.tool_button_owner == Some(id) {
            self.tool_button_owner = None;
        }
    }

    pub fn visible_tooltip(&self) -> Option<TooltipView<'_>> {
        if !self.tooltip_visible {
            return None;
        }
        let owner = self.tooltip_owner?;
        let bundle = self.items.get(&owner)?.bundle.as_ref()?;
        Some(TooltipView {
            owner,
            rows: &bundle.tooltip,
        })
    }

    pub fn tool_button_owner(&self) -> Option<ItemId> {
        self.tool_button_owner
    }

    /// Replace the key filter and regenerate every loaded item's bundle and
    /// search terms.
    pub fn set_key_filter(&mut self, filter: KeyFilter) {
        self.key_filter = filter;
        for item in self.items.values_mut() {
            item.recompose(&self.key_filter);
        }
        tracing::debug!(items = self.items.len(), "Key filter changed");
    }

    /// Ids of items matching `query`, in insertion order.
    pub fn search(&self, query: &str) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|(_, item)| item.matches(query))
            .map(|(id, _)| *id)
            .collect()
    }

    /// All item ids in the requested order. Ties keep insertion order.
    pub fn sorted(&self, order: SortOrder) -> Vec<ItemId> {
        let mut entries: Vec<(ItemId, &MediaDescriptor)> = self
            .items
            .iter()
            .map(|(id, item)| (*id, &item.descriptor))
            .collect();

        let compare = |a: &MediaDescriptor, b: &MediaDescriptor| -> Ordering {
            match order {
                SortOrder::Added => Ordering::Equal,
                SortOrder::NameAscending => a.filename.cmp(&b.filename),
                SortOrder::NameDescending => b.filename.cmp(&a.filename),
                SortOrder::Newest => b.file_age.cmp(&a.file_age),
                SortOrder::Oldest => a.file_age.cmp(&b.file_age),
                SortOrder::Largest => b.file_size.cmp(&a.file_size),
                SortOrder::Smallest => known_size(a).cmp(&known_size(b)),
            }
        };
        entries.sort_by(|(_, a), (_, b)| compare(a, b));
        entries.into_iter().map(|(id, _)| id).collect()
    }
}

/// Unknown sizes (-1) sort after every known size.
fn known_size(descriptor: &MediaDescriptor) -> i64 {
    if descriptor.file_size < 0 {
        i64::MAX
    } else {
        descriptor.file_size
    }
}

/// Position a tooltip next to the pointer, clamped so it stays inside the
/// viewport.
pub fn place_tooltip(pointer: (i32, i32), tooltip: (i32, i32), viewport: (i32, i32)) -> (i32, i32) {
    let max_x = viewport.0 - tooltip.0 - TOOLTIP_OFFSET.0;
    let max_y = viewport.1 - tooltip.1 - TOOLTIP_OFFSET.1 - TOOLTIP_BOTTOM_MARGIN;
    (
        (pointer.0 + TOOLTIP_OFFSET.0).min(max_x),
        (pointer.1 + TOOLTIP_OFFSET.1).min(max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AssetType;
    use crate::gate::LoadPhase;
    use assert_matches::assert_matches;

    /// Minimal PNG with the given text chunks.
    fn png_with_text(chunks: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 1, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            for (key, value) in chunks {
                encoder
                    .add_text_chunk(key.to_string(), value.to_string())
                    .unwrap();
            }
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0]).unwrap();
        }
        out
    }

    fn png_item(name: &str) -> MediaDescriptor {
        MediaDescriptor::new(name, AssetType::Output)
    }

    #[test]
    fn loaded_media_extends_search_terms() {
        let mut ctx = DrawerContext::default();
        let (id, action) = ctx.add_item(png_item("cat.png"), false).unwrap();
        assert_eq!(action, LoadAction::Fetch);

        let blob = png_with_text(&[("positive_prompt", "a cat"), ("seed", "7")]);
        assert!(ctx.on_media_loaded(id, &blob).unwrap());

        let item = ctx.item(id).unwrap();
        assert_eq!(item.metadata().unwrap().get("seed"), Some("7"));
        assert_eq!(
            item.search_terms(),
            "/jnodes_view_image?filename=cat.png&type=output&subfolder= a cat\n\nseed: 7, "
        );
        assert_eq!(item.copy_entries().len(), 2);
    }

    #[test]
    fn undecodable_media_settles_without_metadata() {
        let mut ctx = DrawerContext::default();
        let (id, _) = ctx.add_item(png_item("broken.png"), false).unwrap();
        assert!(ctx.on_media_loaded(id, b"not a png").unwrap());

        let item = ctx.item(id).unwrap();
        assert_matches!(item.load_state(), LoadState::Loaded { metadata: None });
        assert!(item.bundle().is_none());
        assert!(item.copy_entries().is_empty());
    }

    #[test]
    fn deferred_item_needs_visibility_first() {
        let mut ctx = DrawerContext::default();
        let descriptor = png_item("big.png").with_dimensions(64, 64);
        let (id, action) = ctx.add_item(descriptor, false).unwrap();
        assert_matches!(action, LoadAction::ShowPlaceholder(_));

        assert_matches!(
            ctx.on_media_loaded(id, &[]),
            Err(DrawerError::InvalidTransition {
                from: LoadPhase::Placeholder,
                ..
            })
        );
        assert_eq!(ctx.on_visible(id).unwrap(), LoadAction::Fetch);
        assert!(ctx.on_fetch_failed(id).unwrap());
        assert_matches!(ctx.item(id).unwrap().load_state(), LoadState::Loaded { metadata: None });
    }

    #[test]
    fn completion_for_removed_item_is_ignored() {
        let mut ctx = DrawerContext::default();
        let (id, _) = ctx.add_item(png_item("gone.png"), false).unwrap();
        assert!(ctx.remove_item(id).is_some());

        assert!(!ctx.on_media_loaded(id, &[]).unwrap());
        assert!(!ctx.on_fetch_failed(id).unwrap());
        assert_matches!(ctx.on_visible(id), Err(DrawerError::UnknownItem(_)));
        assert!(ctx.is_empty());
    }

    #[test]
    fn tooltip_ownership() {
        let mut ctx = DrawerContext::default();
        let blob = png_with_text(&[("positive_prompt", "a cat")]);
        let (a, _) = ctx.add_item(png_item("a.png"), false).unwrap();
        let (b, _) = ctx.add_item(png_item("b.png"), false).unwrap();
        ctx.on_media_loaded(a, &blob).unwrap();
        ctx.on_media_loaded(b, &blob).unwrap();

        assert_eq!(ctx.on_mouse_over(a).unwrap().map(|t| t.owner), Some(a));
        assert_eq!(ctx.on_mouse_over(b).unwrap().map(|t| t.owner), Some(b));

        // Late mouse-out from the previous owner leaves b's tooltip alone.
        ctx.on_mouse_out(a);
        assert_eq!(ctx.visible_tooltip().map(|t| t.owner), Some(b));
        assert_eq!(ctx.tool_button_owner(), Some(b));

        ctx.on_mouse_out(b);
        assert!(ctx.visible_tooltip().is_none());
        assert_eq!(ctx.tool_button_owner(), None);
    }

    #[test]
    fn tooltip_appears_when_metadata_arrives_under_pointer() {
        let mut ctx = DrawerContext::default();
        let (id, _) = ctx.add_item(png_item("a.png"), false).unwrap();

        assert!(ctx.on_mouse_over(id).unwrap().is_none());
        ctx.on_media_loaded(id, &png_with_text(&[("seed", "1")])).unwrap();

        let tooltip = ctx.visible_tooltip().unwrap();
        assert_eq!(tooltip.owner, id);
        assert_eq!(tooltip.rows.len(), 1);
    }

    #[test]
    fn drag_removes_tool_button() {
        let mut ctx = DrawerContext::default();
        let (id, _) = ctx.add_item(png_item("a.png"), false).unwrap();
        ctx.on_mouse_over(id).unwrap();
        ctx.on_drag_start(id);
        assert_eq!(ctx.tool_button_owner(), None);
    }

    #[test]
    fn changing_filter_regenerates_bundles() {
        let mut ctx = DrawerContext::default();
        let (id, _) = ctx.add_item(png_item("a.png"), false).unwrap();
        ctx.on_media_loaded(id, &png_with_text(&[("seed", "1"), ("workflow", "{}")]))
            .unwrap();
        assert!(ctx.item(id).unwrap().search_terms().contains("workflow"));

        ctx.set_key_filter(KeyFilter::parse("workflow", false));
        let item = ctx.item(id).unwrap();
        assert!(!item.search_terms().contains("workflow"));
        assert!(item.search_terms().ends_with("\nseed: 1, "));
        assert_eq!(item.bundle().unwrap().tooltip.len(), 1);
    }

    #[test]
    fn search_and_sort() {
        let mut ctx = DrawerContext::default();
        let mut old = png_item("b_old.png");
        old.file_age = 100;
        old.file_size = 10;
        let mut new = png_item("a_new.png");
        new.file_age = 200;
        let (old_id, _) = ctx.add_item(old, false).unwrap();
        let (new_id, _) = ctx.add_item(new, false).unwrap();
        ctx.on_media_loaded(old_id, &png_with_text(&[("positive_prompt", "Red Fox")]))
            .unwrap();

        assert_eq!(ctx.search("fox red"), vec![old_id]);
        assert_eq!(ctx.search(""), vec![old_id, new_id]);

        assert_eq!(ctx.sorted(SortOrder::NameAscending), vec![new_id, old_id]);
        assert_eq!(ctx.sorted(SortOrder::Newest), vec![new_id, old_id]);
        assert_eq!(ctx.sorted(SortOrder::Oldest), vec![old_id, new_id]);
        assert_eq!(ctx.sorted(SortOrder::Largest), vec![old_id, new_id]);
        assert_eq!(ctx.sorted(SortOrder::Smallest), vec![old_id, new_id]);
        assert_eq!(ctx.sorted(SortOrder::Added), vec![old_id, new_id]);
    }

    #[test]
    fn video_items_detected_from_settings() {
        let mut ctx = DrawerContext::from_settings(&DrawerSettings::default());
        let info: FileInfo = serde_json::from_value(serde_json::json!({ "filename": "clip.webm" })).unwrap();
        let (id, _) = ctx.add_file_info(info, false).unwrap();
        assert!(ctx.item(id).unwrap().descriptor().is_video);
        assert!(ctx.video_options().controls);
    }

    #[test]
    fn tooltip_is_clamped_to_viewport() {
        assert_eq!(place_tooltip((100, 100), (50, 50), (1000, 800)), (110, 110));
        assert_eq!(place_tooltip((990, 790), (50, 50), (1000, 800)), (940, 730));
    }
}
