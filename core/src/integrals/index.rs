/// An unordered orbital pair (p, q) used to key one-electron integrals.
///
/// h_pq = h_qp for real orbitals, so the pair is stored with p <= q.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PairIndex(usize, usize);

impl PairIndex {
    pub const fn new(p: usize, q: usize) -> Self {
        let (p, q) = sorted_pair(p, q);
        Self(p, q)
    }

    pub const fn indices(&self) -> (usize, usize) {
        (self.0, self.1)
    }
}

/// A two-electron integral index in chemist's notation, (pq|rs).
///
/// For real orbitals the integral is invariant under p <-> q, r <-> s and
/// (pq) <-> (rs), which splits all index quadruples into classes of (up to)
/// eight. The struct always holds the canonical member of the class: p <= q,
/// r <= s and (p, q) <= (r, s) lexicographically.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct IntegralIndex(usize, usize, usize, usize);

impl IntegralIndex {
    /// Creates a new integral index, canonicalizing the given indices.
    pub const fn new(index: (usize, usize, usize, usize)) -> Self {
        let (p, q, r, s) = canonicalize(index);
        Self(p, q, r, s)
    }

    /// Creates the index of the physicist's-notation integral <pq|rs> = (pr|qs).
    pub const fn from_physicist((p, q, r, s): (usize, usize, usize, usize)) -> Self {
        Self::new((p, r, q, s))
    }

    pub const fn indices(&self) -> (usize, usize, usize, usize) {
        (self.0, self.1, self.2, self.3)
    }

    /// All distinct index quadruples that map onto this canonical index.
    pub fn permutations(&self) -> impl Iterator<Item = (usize, usize, usize, usize)> {
        let &Self(p, q, r, s) = self;
        let mut all = [
            (p, q, r, s),
            (q, p, r, s),
            (p, q, s, r),
            (q, p, s, r),
            (r, s, p, q),
            (s, r, p, q),
            (r, s, q, p),
            (s, r, q, p),
        ];
        all.sort_unstable();
        let mut unique = Vec::with_capacity(8);
        for index in all {
            if unique.last() != Some(&index) {
                unique.push(index);
            }
        }
        unique.into_iter()
    }
}

impl std::fmt::Display for IntegralIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let &Self(p, q, r, s) = self;
        write!(f, "({} {}|{} {})", p, q, r, s)
    }
}

/// Maps any index quadruple (pq|rs) onto the canonical member of its symmetry class.
#[inline(always)]
pub const fn canonicalize(
    (p, q, r, s): (usize, usize, usize, usize),
) -> (usize, usize, usize, usize) {
    let (p, q) = sorted_pair(p, q);
    let (r, s) = sorted_pair(r, s);

    if r < p || (r == p && s < q) {
        (r, s, p, q)
    } else {
        (p, q, r, s)
    }
}

/// Column-major position of (p, q, r, s) in a dense `size`^4 array.
#[inline(always)]
pub(crate) const fn linear((p, q, r, s): (usize, usize, usize, usize), size: usize) -> usize {
    ((s * size + r) * size + q) * size + p
}

#[inline(always)]
const fn sorted_pair(p: usize, q: usize) -> (usize, usize) {
    if p <= q {
        (p, q)
    } else {
        (q, p)
    }
}
