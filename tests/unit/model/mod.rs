mod pooling;
mod rbm;
mod sample;
mod stopping;
