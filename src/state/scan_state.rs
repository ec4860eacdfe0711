use std::collections::{BTreeSet, HashSet};

/// Addresses found on one page, kept ordered so reports are deterministic
pub type AddressSet = BTreeSet<String>;

/// The set of addresses the operator wants to be alerted about
///
/// Loaded once at startup and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    addresses: HashSet<String>,
}

impl WatchList {
    /// Builds a watch-list from newline-delimited text
    ///
    /// Lines are trimmed and blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        text.lines().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for WatchList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let addresses = iter
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { addresses }
    }
}

/// How a page compared against everything seen before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// No addresses were extracted (fetch failure, empty or malformed page)
    Empty,

    /// The page had addresses, but every one of them was already seen
    NothingNew,

    /// At least one address on the page had never been seen before
    New,
}

/// The outcome of folding one page into the scan state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Page index the addresses came from
    pub page: u64,

    /// Every address found on the page
    pub addresses: AddressSet,

    /// Addresses not seen on any earlier page or run
    pub newly_observed: AddressSet,

    /// Newly observed addresses that are on the watch-list
    pub matches: AddressSet,
}

impl PageResult {
    pub fn outcome(&self) -> PageOutcome {
        if self.addresses.is_empty() {
            PageOutcome::Empty
        } else if self.newly_observed.is_empty() {
            PageOutcome::NothingNew
        } else {
            PageOutcome::New
        }
    }

    /// Returns true when the page contributes nothing to the scan
    pub fn is_trivial(&self) -> bool {
        self.newly_observed.is_empty()
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Watch-list plus every address observed so far
///
/// The scheduler is the only writer: workers hand their extracted addresses
/// back and the scheduler applies them one page at a time, in page order.
#[derive(Debug, Clone)]
pub struct ScanState {
    watchlist: WatchList,
    seen: HashSet<String>,
}

impl ScanState {
    /// Creates the state from the watch-list and addresses known from earlier runs
    pub fn new<I>(watchlist: WatchList, previously_seen: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            watchlist,
            seen: previously_seen.into_iter().collect(),
        }
    }

    /// Folds one page's addresses into the state
    ///
    /// Only addresses never seen before are checked against the watch-list, so
    /// a page that is fetched twice never reports the same match twice. When at
    /// least one address is new, the whole page set is added to the seen set.
    pub fn apply(&mut self, page: u64, addresses: AddressSet) -> PageResult {
        let newly_observed: AddressSet = addresses
            .iter()
            .filter(|address| !self.seen.contains(*address))
            .cloned()
            .collect();

        if newly_observed.is_empty() {
            return PageResult {
                page,
                addresses,
                newly_observed,
                matches: AddressSet::new(),
            };
        }

        let matches: AddressSet = newly_observed
            .iter()
            .filter(|address| self.watchlist.contains(address))
            .cloned()
            .collect();

        self.seen.extend(addresses.iter().cloned());

        PageResult {
            page,
            addresses,
            newly_observed,
            matches,
        }
    }

    pub fn is_seen(&self, address: &str) -> bool {
        self.seen.contains(address)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn watchlist(&self) -> &WatchList {
        &self.watchlist
    }
}
