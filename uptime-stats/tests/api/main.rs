mod export_run;
mod helpers;
