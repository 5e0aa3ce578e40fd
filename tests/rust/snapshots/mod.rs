//! Page snapshot tests - golden-file regression coverage for every rendered
//! route, including the number of catalog queries each page is allowed to
//! issue.

mod page_snapshots;
