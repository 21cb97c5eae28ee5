mod default_fragments;
mod pagination;
mod regressions;
mod support;
