//! The manager: owns every mutable structure a diagram lives in — pool,
//! unique tables, operation cache, ordering, and domain descriptor — and
//! is the sole entry point clients use to build and combine diagrams.
//!
//! A manager is `!Send`/`!Sync` by construction: `ManagerInner` lives
//! behind an `Rc<RefCell<_>>` shared with every [`Diagram`] handle it has
//! issued, so its mutable state can never be touched from two threads at
//! once. Clients needing concurrency create one manager per thread.

mod apply;
mod enumerate;
mod gc;
mod reorder;
mod traverse;

use std::cell::RefCell;
use std::rc::Rc;

use log::info;
use num_bigint::BigUint;

use crate::diagram::Diagram;
use crate::error::{Error, Result};
use crate::mem::fxhash::FxHashMap;
use crate::mem::pool::Pool;
use crate::node::{Level, NodeData, NodeId, VarIndex, NONDETERMINED};
use crate::op_cache::OpCache;
use crate::ops::BinOp;
use crate::unique_table::UniqueTable;

pub use enumerate::SatisfyCollector;

/// How the manager's variables share their value ranges.
#[derive(Clone, Debug)]
pub enum DomainKind {
    /// Every variable has domain {0,1} (a classical BDD).
    Binary,
    /// Every variable shares the same domain size `M`.
    Homogeneous(u32),
    /// Each variable has its own domain size.
    Heterogeneous(Vec<u32>),
}

impl DomainKind {
    fn resolve(&self, var_count: u32) -> Result<Vec<u32>> {
        match self {
            DomainKind::Binary => Ok(vec![2; var_count as usize]),
            DomainKind::Homogeneous(m) => {
                if *m < 2 {
                    return Err(Error::invalid("homogeneous domain size must be >= 2"));
                }
                Ok(vec![*m; var_count as usize])
            }
            DomainKind::Heterogeneous(domains) => {
                if domains.len() != var_count as usize {
                    return Err(Error::invalid("domain vector length must equal var_count"));
                }
                if domains.iter().any(|&d| d < 2) {
                    return Err(Error::invalid("every variable domain must be >= 2"));
                }
                Ok(domains.clone())
            }
        }
    }

    fn is_binary(&self) -> bool {
        matches!(self, DomainKind::Binary)
    }
}

/// Construction-time tuning, separated from the manager's hard parameters
/// (variable count, domains) the way pool/cache ratios are kept apart from
/// the pool's own fixed slab sizes.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    var_count: u32,
    domain: DomainKind,
    order: Option<Vec<VarIndex>>,
    primary_pool_size: usize,
    overflow_pool_size: usize,
    max_overflow_slabs: Option<usize>,
    cache_ratio: f64,
    gc_ratio: f64,
    auto_reorder: bool,
    auto_reorder_growth_threshold: f64,
}

impl ManagerConfig {
    pub fn new(var_count: u32, domain: DomainKind) -> Self {
        ManagerConfig {
            var_count,
            domain,
            order: None,
            primary_pool_size: 4096,
            overflow_pool_size: 4096,
            max_overflow_slabs: None,
            cache_ratio: 0.5,
            gc_ratio: 0.1,
            auto_reorder: false,
            auto_reorder_growth_threshold: 2.0,
        }
    }

    pub fn primary_pool_size(mut self, n: usize) -> Self {
        self.primary_pool_size = n;
        self
    }

    pub fn overflow_pool_size(mut self, n: usize) -> Self {
        self.overflow_pool_size = n;
        self
    }

    pub fn max_overflow_slabs(mut self, n: usize) -> Self {
        self.max_overflow_slabs = Some(n);
        self
    }

    pub fn cache_ratio(mut self, r: f64) -> Self {
        self.cache_ratio = r;
        self
    }

    pub fn gc_ratio(mut self, r: f64) -> Self {
        self.gc_ratio = r;
        self
    }

    pub fn auto_reorder(mut self, enabled: bool) -> Self {
        self.auto_reorder = enabled;
        self
    }

    /// Explicit initial variable order as a level -> index mapping;
    /// defaults to the identity order when omitted.
    pub fn order(mut self, order: Vec<VarIndex>) -> Self {
        self.order = Some(order);
        self
    }
}

pub(crate) struct ManagerInner {
    pool: Pool,
    tables: Vec<UniqueTable>,
    terminals: FxHashMap<i32, NodeId>,
    op_cache: OpCache,
    order: Vec<VarIndex>,
    level_of: Vec<Level>,
    domains: Vec<u32>,
    var_count: u32,
    binary: bool,
    cache_ratio: f64,
    gc_ratio: f64,
    auto_reorder: bool,
    auto_reorder_growth_threshold: f64,
    initial_pool_size: usize,
    live_at_last_gc_check: usize,
    /// Nodes produced by an in-progress recursive construction (apply,
    /// DPLD, reorder's column rebuild, ...) that aren't referenced by any
    /// root yet — only by a `NodeId` sitting in some Rust call frame's
    /// local variables. `gc::run` treats these the same as root-counted
    /// nodes so a GC triggered by `alloc_with_retry` mid-recursion can't
    /// sweep a node the caller hasn't had a chance to wire in yet. See
    /// `protect`/`protected_mark`/`release_protected`.
    protected: Vec<NodeId>,
}

impl ManagerInner {
    fn new(config: ManagerConfig) -> Result<Self> {
        let domains = config.domain.resolve(config.var_count)?;
        let order = config
            .order
            .unwrap_or_else(|| (0..config.var_count).collect());
        if order.len() != config.var_count as usize {
            return Err(Error::invalid("explicit order length must equal var_count"));
        }
        let mut level_of = vec![0u32; config.var_count as usize];
        for (level, &index) in order.iter().enumerate() {
            level_of[index as usize] = level as u32;
        }
        let tables = (0..config.var_count).map(UniqueTable::new).collect();
        let op_cache = OpCache::new(config.primary_pool_size / 2 + 61);
        let pool = Pool::new(
            config.primary_pool_size,
            config.overflow_pool_size,
            config.max_overflow_slabs,
        );
        Ok(ManagerInner {
            pool,
            tables,
            terminals: FxHashMap::default(),
            op_cache,
            order,
            level_of,
            domains,
            var_count: config.var_count,
            binary: config.domain.is_binary(),
            cache_ratio: config.cache_ratio,
            gc_ratio: config.gc_ratio,
            auto_reorder: config.auto_reorder,
            auto_reorder_growth_threshold: config.auto_reorder_growth_threshold,
            initial_pool_size: config.primary_pool_size,
            live_at_last_gc_check: 0,
            protected: Vec::new(),
        })
    }

    pub(crate) fn var_count(&self) -> u32 {
        self.var_count
    }

    pub(crate) fn domain(&self, index: VarIndex) -> u32 {
        self.domains[index as usize]
    }

    pub(crate) fn leaf_level(&self) -> Level {
        self.var_count
    }

    pub(crate) fn level_of_index(&self, index: VarIndex) -> Level {
        self.level_of[index as usize]
    }

    pub(crate) fn index_at_level(&self, level: Level) -> VarIndex {
        self.order[level as usize]
    }

    pub(crate) fn level_of_node(&self, id: NodeId) -> Level {
        match self.pool.get(id).var_index() {
            Some(index) => self.level_of_index(index),
            None => self.leaf_level(),
        }
    }

    pub(crate) fn son_of(&self, id: NodeId, k: u32) -> NodeId {
        self.pool.get(id).sons().expect("son_of on a terminal").get(k as usize)
    }

    pub(crate) fn var_index_of(&self, id: NodeId) -> Option<VarIndex> {
        self.pool.get(id).var_index()
    }

    pub(crate) fn value_or_nondet(&self, id: NodeId) -> i32 {
        self.pool.get(id).value().unwrap_or(NONDETERMINED)
    }

    pub(crate) fn is_terminal_value(&self, id: NodeId, v: i32) -> bool {
        self.pool.get(id).value() == Some(v)
    }

    pub(crate) fn pool(&self) -> &Pool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    pub(crate) fn op_cache_mut(&mut self) -> &mut OpCache {
        &mut self.op_cache
    }

    fn alloc_with_retry(&mut self, data: NodeData) -> Result<NodeId> {
        match self.pool.alloc(data.clone()) {
            Ok(id) => Ok(id),
            Err(Error::OutOfNodes) => {
                gc::run(self)?;
                self.pool.alloc(data)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn make_terminal(&mut self, v: i32) -> Result<NodeId> {
        if let Some(&id) = self.terminals.get(&v) {
            return Ok(id);
        }
        let id = self.alloc_with_retry(NodeData::Terminal { value: v })?;
        self.pool.get_mut(id).in_table = true;
        self.terminals.insert(v, id);
        Ok(id)
    }

    pub(crate) fn make_internal_node(&mut self, index: VarIndex, sons: &[NodeId]) -> Result<NodeId> {
        if sons.is_empty() {
            return Err(Error::invalid("a node must have at least one son"));
        }
        if sons.iter().all(|&s| s == sons[0]) {
            return Ok(sons[0]);
        }
        if let Some(existing) = self.tables[index as usize].find(sons) {
            return Ok(existing);
        }
        let id = self.alloc_with_retry(NodeData::Internal {
            index,
            sons: crate::mem::small_sons::SmallSons::from_slice(sons),
        })?;
        self.pool.get_mut(id).in_table = true;
        self.tables[index as usize].insert(sons, id);
        self.maybe_resize_cache();
        Ok(id)
    }

    pub(crate) fn bump_root(&mut self, id: NodeId) {
        self.pool.get_mut(id).refcount += 1;
    }

    pub(crate) fn release_root(&mut self, id: NodeId) {
        let slot = self.pool.get_mut(id);
        if slot.refcount > 0 {
            slot.refcount -= 1;
        }
    }

    /// Current length of the protected-node stack; pair with
    /// `release_protected` to bracket a top-level recursive construction.
    pub(crate) fn protected_mark(&self) -> usize {
        self.protected.len()
    }

    /// Shields `id` from a GC sweep triggered before this construction's
    /// final result is rooted. Safe to call redundantly; entries are
    /// dropped together by the matching `release_protected`.
    pub(crate) fn protect(&mut self, id: NodeId) {
        self.protected.push(id);
    }

    pub(crate) fn release_protected(&mut self, mark: usize) {
        self.protected.truncate(mark);
    }

    pub(crate) fn protected_ids(&self) -> &[NodeId] {
        &self.protected
    }

    pub(crate) fn node_count_total(&self) -> usize {
        self.tables.iter().map(UniqueTable::len).sum::<usize>() + self.terminals.len()
    }

    fn maybe_resize_cache(&mut self) {
        let target = ((self.cache_ratio * self.node_count_total() as f64) as usize).max(61);
        self.op_cache.resize(target);
    }

    fn maybe_auto_reorder(&mut self) -> Result<()> {
        if !self.auto_reorder {
            return Ok(());
        }
        let live = self.node_count_total();
        if self.live_at_last_gc_check == 0 {
            self.live_at_last_gc_check = live;
            return Ok(());
        }
        if live as f64 > self.live_at_last_gc_check as f64 * self.auto_reorder_growth_threshold {
            info!("auto-reorder threshold crossed ({live} live nodes), running a sifting pass");
            reorder::sift(self)?;
            self.live_at_last_gc_check = self.node_count_total();
        }
        Ok(())
    }
}

/// The public entry point: constructs variables/constants, runs apply and
/// the higher-level algorithms built on top of it, and owns the resources
/// every diagram it produces is backed by.
pub struct Manager {
    inner: Rc<RefCell<ManagerInner>>,
}

impl Manager {
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Ok(Manager {
            inner: Rc::new(RefCell::new(ManagerInner::new(config)?)),
        })
    }

    fn wrap(&self, node: NodeId) -> Diagram {
        Diagram::new(self.inner.clone(), node)
    }

    pub fn var_count(&self) -> u32 {
        self.inner.borrow().var_count()
    }

    pub fn domain(&self, index: VarIndex) -> u32 {
        self.inner.borrow().domain(index)
    }

    pub fn constant(&self, v: i32) -> Result<Diagram> {
        let node = self.inner.borrow_mut().make_terminal(v)?;
        Ok(self.wrap(node))
    }

    /// The identity function of variable `i`: evaluates to whatever value
    /// `i` itself takes.
    pub fn variable(&self, index: VarIndex) -> Result<Diagram> {
        let mut inner = self.inner.borrow_mut();
        if index >= inner.var_count() {
            return Err(Error::invalid(format!("variable index {index} out of range")));
        }
        let d = inner.domain(index);
        let mark = inner.protected_mark();
        let outcome = (|| {
            let mut sons = Vec::with_capacity(d as usize);
            for v in 0..d as i32 {
                let son = inner.make_terminal(v)?;
                inner.protect(son);
                sons.push(son);
            }
            inner.make_internal_node(index, &sons)
        })();
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let diagram = self.wrap(node);
        self.inner.borrow_mut().release_protected(mark);
        Ok(diagram)
    }

    pub fn variables(&self, indices: impl IntoIterator<Item = VarIndex>) -> Result<Vec<Diagram>> {
        indices.into_iter().map(|i| self.variable(i)).collect()
    }

    /// Negation of a Boolean variable's diagram; only meaningful for
    /// binary managers.
    pub fn variable_not(&self, index: VarIndex) -> Result<Diagram> {
        {
            let inner = self.inner.borrow();
            if !inner.binary {
                return Err(Error::precond("variable_not is only defined for binary managers"));
            }
        }
        let v = self.variable(index)?;
        self.transform(&v, |x| 1 - x)
    }

    pub fn apply<Op: BinOp>(&self, lhs: &Diagram, rhs: &Diagram) -> Result<Diagram> {
        if !lhs.same_manager(rhs) {
            return Err(Error::invalid("apply operands belong to different managers"));
        }
        let mut inner = self.inner.borrow_mut();
        let mark = inner.protected_mark();
        let outcome = apply::apply_rec::<Op>(&mut inner, lhs.node(), rhs.node()).and_then(|node| {
            inner.maybe_auto_reorder()?;
            Ok(node)
        });
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let diagram = self.wrap(node);
        self.inner.borrow_mut().release_protected(mark);
        Ok(diagram)
    }

    pub fn left_fold<Op: BinOp>(&self, seq: &[Diagram]) -> Result<Diagram> {
        let mut iter = seq.iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::invalid("left_fold requires a non-empty sequence"))?
            .clone();
        iter.try_fold(first, |acc, d| self.apply::<Op>(&acc, d))
    }

    pub fn tree_fold<Op: BinOp>(&self, seq: &[Diagram]) -> Result<Diagram> {
        if seq.is_empty() {
            return Err(Error::invalid("tree_fold requires a non-empty sequence"));
        }
        let mut buf: Vec<Diagram> = seq.to_vec();
        while buf.len() > 1 {
            let mut next = Vec::with_capacity(buf.len().div_ceil(2));
            let mut it = buf.into_iter();
            while let Some(a) = it.next() {
                match it.next() {
                    Some(b) => next.push(self.apply::<Op>(&a, &b)?),
                    None => next.push(a),
                }
            }
            buf = next;
        }
        Ok(buf.into_iter().next().unwrap())
    }

    pub fn evaluate(&self, d: &Diagram, vars: &[u32]) -> Result<i32> {
        let inner = self.inner.borrow();
        enumerate::evaluate(&inner, d.node(), vars)
    }

    pub fn cofactor(&self, d: &Diagram, index: VarIndex, value: u32) -> Result<Diagram> {
        self.cofactor_many(d, &[(index, value)])
    }

    pub fn cofactor_many(&self, d: &Diagram, restrictions: &[(VarIndex, u32)]) -> Result<Diagram> {
        let mut inner = self.inner.borrow_mut();
        let mark = inner.protected_mark();
        let outcome = enumerate::cofactor(&mut inner, d.node(), restrictions);
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let diagram = self.wrap(node);
        self.inner.borrow_mut().release_protected(mark);
        Ok(diagram)
    }

    pub fn transform(&self, d: &Diagram, phi: impl Fn(i32) -> i32) -> Result<Diagram> {
        let mut inner = self.inner.borrow_mut();
        let mark = inner.protected_mark();
        let outcome = enumerate::transform(&mut inner, d.node(), &phi);
        if outcome.is_err() {
            inner.release_protected(mark);
        }
        let node = outcome?;
        drop(inner);
        let diagram = self.wrap(node);
        self.inner.borrow_mut().release_protected(mark);
        Ok(diagram)
    }

    pub fn reduce(&self, d: &Diagram) -> Result<Diagram> {
        self.transform(d, |v| v)
    }

    pub fn negate(&self, d: &Diagram) -> Result<Diagram> {
        {
            let inner = self.inner.borrow();
            if !inner.binary {
                return Err(Error::precond("negate is only defined for binary managers"));
            }
        }
        self.transform(d, |v| 1 - v)
    }

    pub fn satisfy_count(&self, j: i32, d: &Diagram) -> Result<u64> {
        let inner = self.inner.borrow();
        enumerate::satisfy_count(&inner, j, d.node())
    }

    pub fn satisfy_count_big(&self, j: i32, d: &Diagram) -> Result<BigUint> {
        let inner = self.inner.borrow();
        enumerate::satisfy_count_big(&inner, j, d.node())
    }

    /// log2 of `satisfy_count(1, d)`; only defined for binary managers.
    pub fn satisfy_count_ln(&self, d: &Diagram) -> Result<f64> {
        let inner = self.inner.borrow();
        if !inner.binary {
            return Err(Error::precond("satisfy_count_ln is only defined for binary managers"));
        }
        enumerate::satisfy_count_ln(&inner, d.node())
    }

    pub fn satisfy_one<V: SatisfyCollector>(&self, j: i32, d: &Diagram) -> Result<Option<V>> {
        let inner = self.inner.borrow();
        enumerate::satisfy_one(&inner, j, d.node())
    }

    pub fn satisfy_all<V: SatisfyCollector>(&self, j: i32, d: &Diagram) -> Result<Vec<V>> {
        let inner = self.inner.borrow();
        enumerate::satisfy_all(&inner, j, d.node())
    }

    pub fn get_dependency_set(&self, d: &Diagram) -> Result<Vec<VarIndex>> {
        let inner = self.inner.borrow();
        Ok(traverse::dependency_set(&inner, d.node()))
    }

    /// Manager-wide distinct node count (sum of all unique tables' sizes).
    pub fn get_node_count(&self) -> usize {
        self.inner.borrow().node_count_total()
    }

    pub fn get_node_count_of(&self, d: &Diagram) -> usize {
        let inner = self.inner.borrow();
        traverse::pre_order(&inner, d.node()).len()
    }

    pub fn force_gc(&self) -> Result<usize> {
        gc::run(&mut self.inner.borrow_mut())
    }

    pub fn force_reorder(&self) -> Result<()> {
        reorder::sift(&mut self.inner.borrow_mut())
    }

    pub fn clear_cache(&self) {
        self.inner.borrow_mut().op_cache_mut().clear();
    }

    pub fn set_cache_ratio(&self, r: f64) {
        self.inner.borrow_mut().cache_ratio = r;
    }

    pub fn set_gc_ratio(&self, r: f64) {
        self.inner.borrow_mut().gc_ratio = r;
    }

    pub fn set_auto_reorder(&self, enabled: bool) {
        self.inner.borrow_mut().auto_reorder = enabled;
    }

    pub(crate) fn inner_handle(&self) -> Rc<RefCell<ManagerInner>> {
        self.inner.clone()
    }
}
