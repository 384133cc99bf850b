use plotters::chart::ChartContext;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;

pub mod barplot;
pub mod chromoplot;
pub mod chromosome;
pub mod karyoplot;
pub mod link;
pub mod synteny;

/// Every renderer draws into a plain f64 cartesian chart; the alias keeps
/// the glyph signatures readable.
pub type Canvas2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
