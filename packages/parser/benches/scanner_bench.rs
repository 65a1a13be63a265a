use criterion::{black_box, criterion_group, criterion_main, Criterion};
use livecanvas_parser::{parse_markup, StyleMap, TagIndex};

const SLIDE: &str = r#"
import React from 'react';

export default function Slide({ data }) {
  return (
    <div style={{position:'relative', width:'1280px', height:'720px'}}>
      <h1 style={{left:'40px', top:'32px', fontSize:'48px'}}>{data.title}</h1>
      <p style={{left:'40px', top:'120px', width:'600px'}}>{data.subtitle}</p>
      <img src={data.image} style={{left:'700px', top:'120px', width:'480px', height:'320px'}} />
      <ul style={{left:'40px', top:'200px'}}>
        <li>First point</li>
        <li>Second point</li>
        <li>Third point</li>
      </ul>
    </div>
  );
}
"#;

fn scan_slide(c: &mut Criterion) {
    c.bench_function("scan_slide", |b| b.iter(|| TagIndex::build(black_box(SLIDE))));
}

fn markup_slide(c: &mut Criterion) {
    c.bench_function("markup_slide", |b| b.iter(|| parse_markup(black_box(SLIDE))));
}

fn parse_style(c: &mut Criterion) {
    let style = "{left:'700px', top:'120px', width:'480px', height:'320px', color: data.color}";
    c.bench_function("parse_style", |b| {
        b.iter(|| StyleMap::parse_object(black_box(style)))
    });
}

criterion_group!(benches, scan_slide, markup_slide, parse_style);
criterion_main!(benches);
