//! One file in memory: the ordered segment list plus accessors over the
//! decoded segments.
//!
//! Nothing touches storage until [`Document::write`] or
//! [`Document::write_to`]. Segments that are never borrowed mutably are
//! written back exactly as they were read.


use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::blocks::history::EMPTY_HISTORY;
use crate::blocks::{
    AlignableSequences, AlignedSequence, Block, DnaSequence, Feature, FeatureTable, Header,
    Notes, ProteinSequence, Reference, RestrictionDigest, Strandedness, Topology, TraceBlob,
    TraceDescriptor,
};
use crate::container::{codes, decode_segments, encode_segments, Registry, Segment};
use crate::error::{SnapError, SnapResult};
use crate::placement;

#[derive(Clone, Debug)]
pub struct Document {
    segments: Vec<Segment>,
    path: Option<PathBuf>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a default cookie and an empty restriction digest.
    pub fn new() -> Self {
        Self {
            segments: vec![
                Segment::from_block(Header::default()),
                Segment::from_block(RestrictionDigest::default()),
            ],
            path: None,
        }
    }

    pub fn from_bytes(data: &[u8]) -> SnapResult<Self> {
        Self::from_bytes_with(data, &Registry::standard())
    }

    pub fn from_bytes_with(data: &[u8], registry: &Registry) -> SnapResult<Self> {
        Ok(Self {
            segments: decode_segments(data, registry)?,
            path: None,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> SnapResult<Self> {
        Self::open_with(path, &Registry::standard())
    }

    pub fn open_with(path: impl AsRef<Path>, registry: &Registry) -> SnapResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut doc = Self::from_bytes_with(&data, registry)?;
        tracing::debug!(path = %path.display(), segments = doc.segments.len(), "opened document");
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    pub fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        encode_segments(&self.segments)
    }

    /// Write back to the path the document was opened from.
    pub fn write(&self) -> SnapResult<()> {
        let path = self.path.as_deref().ok_or(SnapError::MissingOutputPath)?;
        self.write_to(path)
    }

    /// Write to `path`. The file is only created once encoding succeeded.
    pub fn write_to(&self, path: impl AsRef<Path>) -> SnapResult<()> {
        let path = path.as_ref();
        let data = self.to_bytes()?;
        fs::write(path, &data)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "wrote document");
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn block<T>(&self, type_code: u8, get: fn(&Block) -> Option<&T>) -> Option<&T> {
        self.segments
            .iter()
            .find(|s| s.type_code() == type_code)
            .and_then(Segment::block)
            .and_then(get)
    }

    fn block_mut<T>(
        &mut self,
        type_code: u8,
        get: fn(&mut Block) -> Option<&mut T>,
    ) -> SnapResult<Option<&mut T>> {
        match self.segments.iter_mut().find(|s| s.type_code() == type_code) {
            None => Ok(None),
            Some(segment) => segment
                .block_mut()
                .and_then(get)
                .map(Some)
                .ok_or(SnapError::NotDecoded { type_code }),
        }
    }

    /// Mutable access to the first segment of a type, appending a default
    /// one if there is none.
    fn block_or_insert<T: Default + Into<Block>>(
        &mut self,
        type_code: u8,
        get: fn(&mut Block) -> Option<&mut T>,
    ) -> SnapResult<&mut T> {
        let pos = match self.segments.iter().position(|s| s.type_code() == type_code) {
            Some(pos) => pos,
            None => {
                self.segments.push(Segment::from_block(T::default()));
                self.segments.len() - 1
            }
        };
        self.segments[pos]
            .block_mut()
            .and_then(get)
            .ok_or(SnapError::NotDecoded { type_code })
    }

    // Header

    pub fn header(&self) -> Option<&Header> {
        self.block(codes::COOKIE, Block::as_header)
    }

    pub fn header_mut(&mut self) -> SnapResult<&mut Header> {
        self.block_mut(codes::COOKIE, Block::as_header_mut)?
            .ok_or(SnapError::MalformedContainer {
                msg: "document has no cookie segment",
                offset: 0,
            })
    }

    // Sequence

    pub fn dna(&self) -> Option<&DnaSequence> {
        self.block(codes::DNA, Block::as_dna)
    }

    pub fn dna_mut(&mut self) -> SnapResult<&mut DnaSequence> {
        self.block_or_insert(codes::DNA, Block::as_dna_mut)
    }

    pub fn protein(&self) -> Option<&ProteinSequence> {
        self.block(codes::PROTEIN, Block::as_protein)
    }

    pub fn protein_mut(&mut self) -> SnapResult<&mut ProteinSequence> {
        self.block_or_insert(codes::PROTEIN, Block::as_protein_mut)
    }

    /// The DNA bases, or the protein residues when there is no DNA.
    pub fn sequence(&self) -> Option<&[u8]> {
        self.dna()
            .map(DnaSequence::as_bytes)
            .or_else(|| self.protein().map(ProteinSequence::as_bytes))
    }

    /// Replace the DNA bases, or the protein residues in a protein-only
    /// document. A document with neither gets a DNA segment.
    pub fn set_sequence(&mut self, bases: impl Into<Vec<u8>>) -> SnapResult<()> {
        if self.dna().is_none() && self.protein().is_some() {
            self.protein_mut()?.residues = bases.into();
        } else {
            self.dna_mut()?.bases = bases.into();
        }
        Ok(())
    }

    pub fn set_protein_sequence(&mut self, residues: impl Into<Vec<u8>>) -> SnapResult<()> {
        self.protein_mut()?.residues = residues.into();
        Ok(())
    }

    pub fn topology(&self) -> Option<Topology> {
        self.dna().map(|dna| dna.topology)
    }

    pub fn set_topology(&mut self, topology: Topology) -> SnapResult<()> {
        self.dna_mut()?.topology = topology;
        Ok(())
    }

    pub fn strandedness(&self) -> Option<Strandedness> {
        self.dna().map(|dna| dna.strandedness)
    }

    pub fn set_strandedness(&mut self, strandedness: Strandedness) -> SnapResult<()> {
        self.dna_mut()?.strandedness = strandedness;
        Ok(())
    }

    // Features

    pub fn feature_table(&self) -> Option<&FeatureTable> {
        self.block(codes::FEATURES, Block::as_features)
    }

    pub fn features(&self) -> &[Feature] {
        self.feature_table()
            .map(|table| table.features.as_slice())
            .unwrap_or(&[])
    }

    /// First feature called `name`.
    pub fn feature(&self, name: &str) -> SnapResult<&Feature> {
        self.feature_table()
            .and_then(|table| table.get(name))
            .ok_or_else(|| SnapError::not_found("feature", name))
    }

    pub fn feature_mut(&mut self, name: &str) -> SnapResult<&mut Feature> {
        // Look up before borrowing mutably so a miss leaves the segment pristine.
        self.feature(name)?;
        self.block_mut(codes::FEATURES, Block::as_features_mut)?
            .and_then(|table| table.get_mut(name))
            .ok_or_else(|| SnapError::not_found("feature", name))
    }

    pub fn count_features(&self) -> usize {
        self.features().len()
    }

    /// Append `feature` as given, returning the id it was assigned.
    pub fn add_feature(&mut self, feature: Feature) -> SnapResult<u32> {
        let table = self.block_or_insert(codes::FEATURES, Block::as_features_mut)?;
        Ok(table.push(feature))
    }

    /// Add a copy of `template` over every occurrence of `query` in the
    /// sequence and return how many were added. No match adds nothing.
    pub fn place_feature(&mut self, template: &Feature, query: &[u8]) -> SnapResult<usize> {
        let placed = placement::place(template, self.sequence().unwrap_or_default(), query);
        if placed.is_empty() {
            tracing::debug!(feature = %template.name, "query not found, nothing placed");
            return Ok(0);
        }

        let count = placed.len();
        let table = self.block_or_insert(codes::FEATURES, Block::as_features_mut)?;
        for feature in placed {
            table.push(feature);
        }
        Ok(count)
    }

    /// Remove every feature called `name`. Remaining ids are renumbered.
    pub fn remove_feature(&mut self, name: &str) -> SnapResult<()> {
        self.feature(name)?;
        let removed = self
            .block_mut(codes::FEATURES, Block::as_features_mut)?
            .map_or(0, |table| table.remove(name));
        if removed == 0 {
            return Err(SnapError::not_found("feature", name));
        }
        Ok(())
    }

    /// Empty the feature table. The table segment itself stays.
    pub fn clear_features(&mut self) -> SnapResult<()> {
        self.block_or_insert(codes::FEATURES, Block::as_features_mut)?
            .clear();
        Ok(())
    }

    // Notes

    pub fn notes(&self) -> Option<&Notes> {
        self.block(codes::NOTES, Block::as_notes)
    }

    pub fn notes_mut(&mut self) -> SnapResult<&mut Notes> {
        self.block_or_insert(codes::NOTES, Block::as_notes_mut)
    }

    pub fn references(&self) -> Vec<Reference> {
        self.notes().map(Notes::references).unwrap_or_default()
    }

    // Traces

    fn descriptors_mut(&mut self) -> SnapResult<&mut AlignableSequences> {
        self.block_or_insert(codes::ALIGNABLE_SEQUENCES, Block::as_alignments_mut)
    }

    fn aligned_sequences(&self) -> impl Iterator<Item = &AlignedSequence> {
        self.segments
            .iter()
            .filter(|s| s.type_code() == codes::ALIGNED_SEQUENCE)
            .filter_map(Segment::block)
            .filter_map(Block::as_aligned_sequence)
    }

    pub fn traces(&self) -> &[TraceDescriptor] {
        self.block(codes::ALIGNABLE_SEQUENCES, Block::as_alignments)
            .map(|table| table.sequences.as_slice())
            .unwrap_or(&[])
    }

    pub fn trace_names(&self) -> Vec<&str> {
        self.traces().iter().map(|t| t.name.as_str()).collect()
    }

    pub fn has_trace(&self, name: &str) -> bool {
        self.traces().iter().any(|t| t.name == name)
    }

    pub fn count_traces(&self) -> usize {
        self.traces().len()
    }

    /// Add a trace, replacing any traces of the same name at the position of
    /// the first one. Otherwise the trace goes after the existing ones.
    pub fn add_trace(&mut self, name: &str, ztr: impl Into<Vec<u8>>) -> SnapResult<()> {
        match self.traces().iter().position(|t| t.name == name) {
            Some(index) => {
                self.remove_trace(name)?;
                self.insert_trace(index, name, ztr)
            }
            None => self.append_trace(name, ztr),
        }
    }

    pub fn append_trace(&mut self, name: &str, ztr: impl Into<Vec<u8>>) -> SnapResult<()> {
        self.insert_trace(self.count_traces(), name, ztr)
    }

    pub fn prepend_trace(&mut self, name: &str, ztr: impl Into<Vec<u8>>) -> SnapResult<()> {
        self.insert_trace(0, name, ztr)
    }

    /// Insert a trace at `index` (clamped to the list length). Duplicate
    /// names are allowed.
    pub fn insert_trace(
        &mut self,
        index: usize,
        name: &str,
        ztr: impl Into<Vec<u8>>,
    ) -> SnapResult<()> {
        let descriptors = self.descriptors_mut()?;
        let id = descriptors.next_id();
        let index = index.min(descriptors.sequences.len());
        descriptors
            .sequences
            .insert(index, TraceDescriptor::new(id, name));

        self.segments.push(Segment::from_block(AlignedSequence::new(
            id,
            vec![TraceBlob::ztr(ztr)],
        )));
        self.sync_traces()
    }

    /// Remove every trace called `name` along with its data. Remaining ids
    /// are renumbered from zero on both the descriptors and the data.
    pub fn remove_trace(&mut self, name: &str) -> SnapResult<()> {
        if !self.has_trace(name) {
            return Err(SnapError::not_found("trace", name));
        }
        let descriptors = self
            .block_mut(codes::ALIGNABLE_SEQUENCES, Block::as_alignments_mut)?
            .ok_or_else(|| SnapError::not_found("trace", name))?;

        let removed: HashSet<u32> = descriptors
            .sequences
            .iter()
            .filter(|t| t.name == name)
            .map(|t| t.id)
            .collect();
        if removed.is_empty() {
            return Err(SnapError::not_found("trace", name));
        }
        descriptors.sequences.retain(|t| t.name != name);

        let mut renumber = HashMap::new();
        for (new_id, desc) in descriptors.sequences.iter_mut().enumerate() {
            let new_id = new_id as u32;
            renumber.insert(desc.id, new_id);
            desc.id = new_id;
        }

        self.segments.retain(|s| {
            s.block()
                .and_then(Block::as_aligned_sequence)
                .map_or(true, |seq| !removed.contains(&seq.id))
        });
        for segment in &mut self.segments {
            let old_id = match segment.block().and_then(Block::as_aligned_sequence) {
                Some(seq) => seq.id,
                None => continue,
            };
            match renumber.get(&old_id) {
                Some(&new_id) if new_id != old_id => {
                    if let Some(seq) = segment.block_mut().and_then(Block::as_aligned_sequence_mut) {
                        seq.id = new_id;
                    }
                }
                _ => {}
            }
        }
        self.sync_traces()
    }

    /// Rename every trace called `old`.
    pub fn rename_trace(&mut self, old: &str, new: &str) -> SnapResult<()> {
        if !self.has_trace(old) {
            return Err(SnapError::not_found("trace", old));
        }
        let descriptors = self
            .block_mut(codes::ALIGNABLE_SEQUENCES, Block::as_alignments_mut)?
            .ok_or_else(|| SnapError::not_found("trace", old))?;
        let mut found = false;
        for desc in descriptors.sequences.iter_mut().filter(|t| t.name == old) {
            desc.name = new.to_string();
            found = true;
        }
        if !found {
            return Err(SnapError::not_found("trace", old));
        }
        Ok(())
    }

    /// Show the trace called `name` and hide all the others.
    pub fn pick_trace(&mut self, name: &str) -> SnapResult<()> {
        if !self.has_trace(name) {
            return Err(SnapError::not_found("trace", name));
        }
        for desc in &mut self.descriptors_mut()?.sequences {
            desc.visible = Some(desc.name == name);
        }
        Ok(())
    }

    pub fn sort_traces_by<F>(&mut self, compare: F) -> SnapResult<()>
    where
        F: FnMut(&TraceDescriptor, &TraceDescriptor) -> Ordering,
    {
        if self.count_traces() == 0 {
            return Ok(());
        }
        let descriptors = self.descriptors_mut()?;
        descriptors.sequences.sort_by(compare);
        descriptors.sync_sort_order();
        Ok(())
    }

    pub fn sort_traces_by_key<K, F>(&mut self, mut key: F) -> SnapResult<()>
    where
        K: Ord,
        F: FnMut(&TraceDescriptor) -> K,
    {
        self.sort_traces_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Drop every trace. An existing descriptor segment is kept, empty.
    pub fn clear_traces(&mut self) -> SnapResult<()> {
        let has_data = self
            .segments
            .iter()
            .any(|s| s.type_code() == codes::ALIGNED_SEQUENCE);
        if self.count_traces() == 0 && !has_data {
            return Ok(());
        }
        if let Some(descriptors) =
            self.block_mut(codes::ALIGNABLE_SEQUENCES, Block::as_alignments_mut)?
        {
            descriptors.sequences.clear();
        }
        self.segments
            .retain(|s| s.type_code() != codes::ALIGNED_SEQUENCE);
        Ok(())
    }

    /// Raw trace blobs of the first trace called `name`.
    pub fn trace_data(&self, name: &str) -> SnapResult<Vec<&[u8]>> {
        let desc = self
            .traces()
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SnapError::not_found("trace", name))?;
        let seq = self
            .aligned_sequences()
            .find(|seq| seq.id == desc.id)
            .ok_or_else(|| SnapError::not_found("trace data", name))?;
        Ok(seq.traces.iter().map(|t| t.bytes.as_slice()).collect())
    }

    /// Write every trace into `dir` as `<name>.ztr`, or `<name>_<n>.ztr`
    /// when a trace has several blobs. Returns the written paths.
    pub fn extract_traces(&self, dir: impl AsRef<Path>) -> SnapResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let by_id: HashMap<u32, &AlignedSequence> =
            self.aligned_sequences().map(|seq| (seq.id, seq)).collect();
        let mut written = Vec::new();
        for desc in self.traces() {
            let Some(seq) = by_id.get(&desc.id) else {
                tracing::warn!(trace = %desc.name, id = desc.id, "trace has no data");
                continue;
            };
            for (i, blob) in seq.traces.iter().enumerate() {
                let file_name = if seq.traces.len() > 1 {
                    format!("{}_{}.ztr", desc.name, i + 1)
                } else {
                    format!("{}.ztr", desc.name)
                };
                let path = dir.join(file_name);
                fs::write(&path, &blob.bytes)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Drop descriptors without data and make sort orders follow the list.
    /// Descriptors are only checked when every data segment was decoded.
    fn sync_traces(&mut self) -> SnapResult<()> {
        let all_decoded = self
            .segments
            .iter()
            .filter(|s| s.type_code() == codes::ALIGNED_SEQUENCE)
            .all(|s| s.block().is_some());
        let present: HashSet<u32> = self.aligned_sequences().map(|seq| seq.id).collect();

        let descriptors = self.descriptors_mut()?;
        if all_decoded {
            descriptors.sequences.retain(|desc| {
                let keep = present.contains(&desc.id);
                if !keep {
                    tracing::warn!(trace = %desc.name, id = desc.id, "dropping trace without data");
                }
                keep
            });
        }
        descriptors.sync_sort_order();
        Ok(())
    }

    // History

    /// Reset the history tree to its empty form and drop all history nodes.
    pub fn clear_history(&mut self) {
        for segment in &mut self.segments {
            if segment.type_code() == codes::HISTORY && !segment.reset() {
                *segment = Segment::opaque(codes::HISTORY, EMPTY_HISTORY.to_vec());
            }
        }
        self.segments
            .retain(|s| s.type_code() != codes::HISTORY_NODE);
    }
}
