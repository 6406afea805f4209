// Domain layer: contract records, the aggregation index and the ports the
// crawl pipeline is written against.

pub mod aggregation;
pub mod model;
pub mod ports;
