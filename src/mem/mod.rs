pub(crate) mod fxhash;
pub(crate) mod pool;
pub(crate) mod prime;
pub(crate) mod small_sons;
