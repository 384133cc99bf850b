pub mod busco_fulltable;
pub mod busco_summary;
pub mod karyotype;
pub mod metaeuk_gff;
