use crate::{
    config::Pagination,
    error::Result,
    file::ProjectFile,
    sink::{DocumentSink, Part},
};
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Running counters of one project's pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    /// 1-based index of the document being filled
    pub document_index: usize,

    /// Characters of file content placed in that document
    pub accumulated: usize,

    /// Number given to the next listing
    pub next_listing: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            document_index: 1,
            accumulated: 0,
            next_listing: 1,
        }
    }
}

/// Builds document paths for one project.
#[derive(Debug, Clone)]
pub struct OutputNaming {
    dir: PathBuf,
    project: String,
    pattern: String,
    extension: String,
}

impl OutputNaming {
    /// Creates naming for documents of `project` saved under `dir`.
    ///
    /// `pattern` supports `{project}`, `{index}` and `{ext}`.
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        project: impl Into<String>,
        pattern: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            project: project.into(),
            pattern: pattern.into(),
            extension: extension.into(),
        }
    }

    /// Returns the path of the 1-based document `index`.
    #[must_use]
    pub fn path(&self, index: usize) -> PathBuf {
        let filename = self
            .pattern
            .replace("{project}", &self.project)
            .replace("{index}", &index.to_string())
            .replace("{ext}", &self.extension);

        self.dir.join(filename)
    }

    /// Returns the directory documents are saved in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Where one listing (or listing part) was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// 1-based document index
    pub document_index: usize,

    /// Listing number, shared by all parts of a file
    pub listing_number: usize,

    /// Relative path of the listed file
    pub relative_path: String,

    /// Part of a split file
    pub part: Option<Part>,

    /// Line number of the first line in this placement
    pub first_line: usize,

    /// Number of lines placed
    pub line_count: usize,
}

/// A document that was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDocument {
    /// 1-based document index
    pub index: usize,

    /// Where it was saved
    pub path: PathBuf,

    /// Characters of file content it holds
    pub chars: usize,

    /// Number of listings (or parts) it holds
    pub listings: usize,
}

/// Everything the paginator decided for one project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaginationReport {
    /// Placements in emission order
    pub placements: Vec<Placement>,

    /// Saved documents in order
    pub documents: Vec<SavedDocument>,

    /// Files that had to be split into parts
    pub split_files: usize,
}

impl PaginationReport {
    /// Number of listing numbers handed out.
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.placements
            .iter()
            .map(|p| p.listing_number)
            .max()
            .unwrap_or(0)
    }
}

/// Splits line indices into consecutive blocks within `max_chars`.
///
/// Each line costs its length plus one for the line break. Blocks are filled
/// greedily; a line that alone exceeds the budget gets a block of its own.
#[must_use]
pub fn compute_line_blocks(lines: &[&str], max_chars: usize) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut start = 0;

    while start < lines.len() {
        let mut end = start;
        let mut acc = 0;

        while end < lines.len() {
            let cost = lines[end].chars().count() + 1;
            if acc == 0 && cost > max_chars {
                end += 1;
                break;
            }
            if acc + cost > max_chars {
                break;
            }
            acc += cost;
            end += 1;
        }

        blocks.push(start..end);
        start = end;
    }

    blocks
}

fn block_chars(lines: &[&str]) -> usize {
    lines.iter().map(|l| l.chars().count() + 1).sum()
}

/// Places the listings of one project into documents.
///
/// Files are pushed one at a time in selection order; the session opens,
/// fills and saves documents through the sink as it goes.
pub struct Paginator<'a, S: DocumentSink> {
    sink: &'a mut S,
    naming: &'a OutputNaming,
    appendix_label: &'a str,
    pagination: Pagination,
    files_per_document: usize,
    keep_trailing_empty_line: bool,
    state: PaginationState,
    current: Option<S::Handle>,
    listings_in_document: usize,
    report: PaginationReport,
}

impl<'a, S: DocumentSink> Paginator<'a, S> {
    /// Starts a project.
    ///
    /// `expected_files` is the number of selected files; the document-count
    /// policy derives files per document from it.
    pub fn new(
        sink: &'a mut S,
        naming: &'a OutputNaming,
        appendix_label: &'a str,
        pagination: Pagination,
        expected_files: usize,
        keep_trailing_empty_line: bool,
    ) -> Self {
        let files_per_document = match pagination {
            Pagination::DocumentCount(count) => expected_files.div_ceil(count.max(1)).max(1),
            Pagination::CharBudget(_) => usize::MAX,
        };

        Self {
            sink,
            naming,
            appendix_label,
            pagination,
            files_per_document,
            keep_trailing_empty_line,
            state: PaginationState::default(),
            current: None,
            listings_in_document: 0,
            report: PaginationReport::default(),
        }
    }

    /// Returns the current counters.
    #[must_use]
    pub const fn state(&self) -> PaginationState {
        self.state
    }

    /// Places one file.
    ///
    /// # Errors
    ///
    /// Returns an error if saving a filled document fails.
    pub fn push(&mut self, file: &ProjectFile) -> Result<()> {
        match self.pagination {
            Pagination::CharBudget(max_chars) if file.char_count > max_chars => {
                self.place_oversized(file, max_chars)
            }
            Pagination::CharBudget(max_chars) => {
                if self.listings_in_document > 0
                    && self.state.accumulated + file.char_count > max_chars
                {
                    self.finish_document()?;
                }
                self.place_whole(file);
                Ok(())
            }
            Pagination::DocumentCount(_) => {
                if self.listings_in_document >= self.files_per_document {
                    self.finish_document()?;
                }
                self.place_whole(file);
                Ok(())
            }
        }
    }

    /// Saves the last document if it holds anything.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn finish(mut self) -> Result<PaginationReport> {
        if self.listings_in_document > 0 {
            self.finish_document()?;
        }

        debug!(
            "Placed {} listings into {} documents",
            self.report.listing_count(),
            self.report.documents.len()
        );
        Ok(self.report)
    }

    fn place_whole(&mut self, file: &ProjectFile) {
        let lines = file.lines(self.keep_trailing_empty_line);
        let number = self.state.next_listing;

        self.emit(number, &file.relative_path, None, &lines, 1);

        trace!(
            "Listing {} -> document {}: {}",
            number, self.state.document_index, file.relative_path
        );

        self.state.next_listing += 1;
        self.state.accumulated += file.char_count;
    }

    fn place_oversized(&mut self, file: &ProjectFile, max_chars: usize) -> Result<()> {
        if self.listings_in_document > 0 {
            self.finish_document()?;
        }

        let lines = file.lines(self.keep_trailing_empty_line);
        let blocks = compute_line_blocks(&lines, max_chars);
        let total = blocks.len();
        let number = self.state.next_listing;

        info!("Large file: {} -> {} parts", file.relative_path, total);

        for (i, block) in blocks.into_iter().enumerate() {
            let part = Part { index: i + 1, total };
            let slice = &lines[block.clone()];

            self.emit(number, &file.relative_path, Some(part), slice, block.start + 1);
            self.state.accumulated = block_chars(slice);
            self.finish_document()?;
        }

        self.state.next_listing += 1;
        self.report.split_files += 1;
        Ok(())
    }

    fn emit(
        &mut self,
        number: usize,
        relative_path: &str,
        part: Option<Part>,
        lines: &[&str],
        first_line: usize,
    ) {
        let label = self.appendix_label;
        let sink = &mut *self.sink;
        let doc = self
            .current
            .get_or_insert_with(|| sink.new_document(label));

        sink.add_listing_heading(doc, number, relative_path, part);
        sink.add_code_table(doc, lines, first_line);
        sink.add_separator(doc);
        self.listings_in_document += 1;

        self.report.placements.push(Placement {
            document_index: self.state.document_index,
            listing_number: number,
            relative_path: relative_path.to_string(),
            part,
            first_line,
            line_count: lines.len(),
        });
    }

    fn finish_document(&mut self) -> Result<()> {
        let Some(doc) = self.current.take() else {
            return Ok(());
        };

        let path = self.naming.path(self.state.document_index);
        self.sink.save(doc, &path)?;
        debug!(
            "Saved document {} ({} chars, {} listings)",
            path.display(),
            self.state.accumulated,
            self.listings_in_document
        );

        self.report.documents.push(SavedDocument {
            index: self.state.document_index,
            path,
            chars: self.state.accumulated,
            listings: self.listings_in_document,
        });

        self.state.document_index += 1;
        self.state.accumulated = 0;
        self.listings_in_document = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordedDocument, RecordingSink};

    fn naming() -> OutputNaming {
        OutputNaming::new("out/proj", "proj", "{project}_listing_{index}.{ext}", "docx")
    }

    fn file(rel: &str, content: &str) -> ProjectFile {
        ProjectFile::new(format!("/p/{rel}"), rel, content)
    }

    fn paginate(
        files: &[ProjectFile],
        pagination: Pagination,
        keep_trailing: bool,
    ) -> (PaginationReport, Vec<RecordedDocument>) {
        let mut sink = RecordingSink::new();
        let naming = naming();
        let mut paginator =
            Paginator::new(&mut sink, &naming, "А", pagination, files.len(), keep_trailing);

        for f in files {
            paginator.push(f).unwrap();
        }
        let report = paginator.finish().unwrap();
        (report, sink.into_documents())
    }

    fn file_names(docs: &[RecordedDocument]) -> Vec<String> {
        docs.iter()
            .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_output_naming() {
        let naming = naming();
        assert_eq!(naming.path(3), PathBuf::from("out/proj/proj_listing_3.docx"));
        assert_eq!(naming.dir(), Path::new("out/proj"));
    }

    #[test]
    fn test_files_sharing_a_document() {
        let files = [file("a.py", "0123456789"), file("b.py", "0123456789")];
        let (report, docs) = paginate(&files, Pagination::CharBudget(25), true);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].listings.len(), 2);
        assert_eq!(docs[0].separators, 2);
        assert_eq!(report.documents[0].chars, 20);
    }

    #[test]
    fn test_second_file_starts_new_document() {
        let files = [file("a.py", "0123456789"), file("b.py", "0123456789")];
        let (report, docs) = paginate(&files, Pagination::CharBudget(15), true);

        assert_eq!(file_names(&docs), vec!["proj_listing_1.docx", "proj_listing_2.docx"]);
        assert_eq!(docs[0].listings[0].number, 1);
        assert_eq!(docs[1].listings[0].number, 2);
        assert_eq!(docs[1].listings[0].relative_name, "b.py");
        assert_eq!(docs[1].appendix_label, "А");
        assert!(report.documents.iter().all(|d| d.chars <= 15));
    }

    #[test]
    fn test_file_exactly_at_budget_fits() {
        let files = [file("a.py", "0123456789")];
        let (report, docs) = paginate(&files, Pagination::CharBudget(10), true);

        assert_eq!(docs.len(), 1);
        assert!(docs[0].listings[0].part.is_none());
        assert_eq!(report.split_files, 0);
    }

    #[test]
    fn test_oversized_file_split_into_parts() {
        // 2_000_000 chars in 100_000 lines of 19 chars + '\n'.
        let line = "x".repeat(19);
        let content = vec![line.as_str(); 100_000].join("\n") + "\n";
        assert_eq!(content.chars().count(), 2_000_000);

        let files = [file("big.txt", &content)];
        let (report, docs) = paginate(&files, Pagination::CharBudget(800_000), true);

        assert_eq!(docs.len(), 3);
        assert_eq!(report.split_files, 1);

        let parts: Vec<_> = docs.iter().map(|d| d.listings[0].part.unwrap()).collect();
        assert_eq!(
            parts.iter().map(|p| p.suffix()).collect::<Vec<_>>(),
            vec!["часть 1/3", "часть 2/3", "часть 3/3"]
        );

        assert!(docs.iter().all(|d| d.listings.len() == 1));
        assert!(docs.iter().all(|d| d.listings[0].number == 1));

        // 800_000 / 20 = 40_000 lines per part; trailing empty line adds one.
        assert_eq!(docs[0].listings[0].first_line, 1);
        assert_eq!(docs[1].listings[0].first_line, 40_001);
        assert_eq!(docs[2].listings[0].first_line, 80_001);
        assert_eq!(docs[2].listings[0].line_count, 20_001);
    }

    #[test]
    fn test_split_parts_reconstruct_file() {
        let content = "alpha\nbeta\ngamma\ndelta\nepsilon\n";
        let files = [file("f.txt", content)];
        let (_, docs) = paginate(&files, Pagination::CharBudget(12), true);

        let rebuilt: Vec<String> = docs
            .iter()
            .flat_map(|d| d.listings[0].lines.clone())
            .collect();
        let expected: Vec<String> = crate::file::split_lines(content, true)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(rebuilt, expected);

        let mut next_line = 1;
        for doc in &docs {
            assert_eq!(doc.listings[0].first_line, next_line);
            next_line += doc.listings[0].line_count;
        }
    }

    #[test]
    fn test_oversized_file_flushes_current_document() {
        let files = [
            file("a.py", "small"),
            file("b.txt", "line one\nline two\nline three"),
            file("c.py", "tail"),
        ];
        let (report, docs) = paginate(&files, Pagination::CharBudget(12), true);

        let numbers: Vec<Vec<usize>> = docs
            .iter()
            .map(|d| d.listings.iter().map(|l| l.number).collect())
            .collect();

        // a | b part 1 | b part 2 | b part 3 | c
        assert_eq!(numbers, vec![vec![1], vec![2], vec![2], vec![2], vec![3]]);
        assert_eq!(report.listing_count(), 3);
        assert_eq!(docs.len(), report.documents.len());
        assert_eq!(
            report.documents.iter().map(|d| d.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_listing_numbers_are_contiguous() {
        let files: Vec<ProjectFile> = (0..20)
            .map(|i| file(&format!("f{i:02}.py"), &"y".repeat(i * 7)))
            .collect();
        let (report, docs) = paginate(&files, Pagination::CharBudget(40), true);

        let mut numbers: Vec<usize> = docs
            .iter()
            .flat_map(|d| d.listings.iter().map(|l| l.number))
            .collect();
        numbers.dedup();

        assert_eq!(numbers, (1..=20).collect::<Vec<_>>());
        for doc in report.documents.iter().filter(|d| d.listings > 1) {
            assert!(doc.chars <= 40);
        }
    }

    #[test]
    fn test_single_long_line_gets_own_block() {
        let lines = ["ab", "0123456789abcdef", "cd", "ef"];
        let blocks = compute_line_blocks(&lines, 8);

        assert_eq!(blocks, vec![0..1, 1..2, 2..4]);
    }

    #[test]
    fn test_compute_line_blocks_empty() {
        assert!(compute_line_blocks(&[], 10).is_empty());
    }

    #[test]
    fn test_empty_file_still_listed() {
        let files = [file("empty.py", "")];
        let (report, docs) = paginate(&files, Pagination::CharBudget(100), true);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].listings[0].lines, vec![""]);
        assert_eq!(report.documents[0].chars, 0);
    }

    #[test]
    fn test_trailing_empty_line_policy() {
        let files = [file("a.py", "x = 1\n")];

        let (_, kept) = paginate(&files, Pagination::CharBudget(100), true);
        assert_eq!(kept[0].listings[0].lines, vec!["x = 1", ""]);

        let (_, dropped) = paginate(&files, Pagination::CharBudget(100), false);
        assert_eq!(dropped[0].listings[0].lines, vec!["x = 1"]);
    }

    #[test]
    fn test_document_count_policy() {
        let files: Vec<ProjectFile> = (0..5)
            .map(|i| file(&format!("f{i}.py"), &"z".repeat(1000)))
            .collect();
        let (report, docs) = paginate(&files, Pagination::DocumentCount(2), true);

        // ceil(5 / 2) = 3 files per document.
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].listings.len(), 3);
        assert_eq!(docs[1].listings.len(), 2);
        assert_eq!(report.split_files, 0);
    }

    #[test]
    fn test_document_count_more_documents_than_files() {
        let files = [file("a.py", "a"), file("b.py", "b")];
        let (_, docs) = paginate(&files, Pagination::DocumentCount(10), true);

        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_no_files_no_documents() {
        let (report, docs) = paginate(&[], Pagination::CharBudget(100), true);

        assert!(docs.is_empty());
        assert!(report.documents.is_empty());
        assert_eq!(report.listing_count(), 0);
    }

    #[test]
    fn test_state_tracks_counters() {
        let mut sink = RecordingSink::new();
        let naming = naming();
        let mut paginator =
            Paginator::new(&mut sink, &naming, "А", Pagination::CharBudget(15), 2, true);

        assert_eq!(paginator.state(), PaginationState::default());

        paginator.push(&file("a.py", "0123456789")).unwrap();
        assert_eq!(
            paginator.state(),
            PaginationState {
                document_index: 1,
                accumulated: 10,
                next_listing: 2,
            }
        );

        paginator.push(&file("b.py", "0123456789")).unwrap();
        assert_eq!(paginator.state().document_index, 2);
        assert_eq!(paginator.state().accumulated, 10);
    }
}
